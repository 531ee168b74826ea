use serde::Deserialize;

/// Main configuration structure for Roundcrawl
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Dispatch and transport behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of fetch tasks in flight at once
    #[serde(rename = "max-concurrency")]
    pub max_concurrency: usize,

    /// Total attempts allowed for a download whose write keeps failing
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Connect timeout for each attempt (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Read timeout for each attempt (seconds)
    #[serde(rename = "read-timeout-secs")]
    pub read_timeout_secs: u64,

    /// Redirects the transport follows before giving up
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,

    /// Whether requests ask the server to keep the connection open
    #[serde(rename = "keep-alive")]
    pub keep_alive: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 32,
            max_retries: 3,
            connect_timeout_secs: 10,
            read_timeout_secs: 10,
            max_redirects: 1,
            keep_alive: false,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory downloaded files are written into
    #[serde(rename = "save-dir")]
    pub save_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_dir: ".".to_string(),
        }
    }
}
