//! Roundcrawl: an interactive, round-based link crawler
//!
//! This crate fetches pages starting from a seed URL, extracts hyperlinks,
//! narrows them through user-selected filters and fetches the survivors in the
//! next round, optionally saving matching binary resources to disk.

pub mod config;
pub mod crawler;
pub mod filter;
pub mod output;
pub mod shell;
pub mod state;
pub mod storage;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Roundcrawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Output directory does not exist: {}", path.display())]
    MissingOutputDir { path: PathBuf },

    #[error("Invalid filter pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No tokio runtime available: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Failure of a single request attempt, as classified by the transport
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connect timeout for {url}")]
    ConnectTimeout { url: String },

    #[error("Socket timeout for {url}")]
    SocketTimeout { url: String },

    #[error("Malformed URI {url}: {message}")]
    MalformedUri { url: String, message: String },

    #[error("HTTP error for {url} (status {status:?})")]
    Http { url: String, status: Option<u16> },

    #[error("Request to {url} failed: {message}")]
    Unknown { url: String, message: String },
}

impl TransportError {
    /// Returns the failure class used for round statistics
    pub fn kind(&self) -> state::FailureKind {
        use state::FailureKind;
        match self {
            Self::ConnectTimeout { .. } => FailureKind::ConnectTimeout,
            Self::SocketTimeout { .. } => FailureKind::SocketTimeout,
            Self::MalformedUri { .. } => FailureKind::MalformedUri,
            Self::Http { .. } => FailureKind::HttpError,
            Self::Unknown { .. } => FailureKind::Unknown,
        }
    }
}

/// Result type alias for Roundcrawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, Link};
pub use filter::{DownloadFilter, FilterChain, LinkFilter};
pub use state::{DispatchPhase, FailureKind};
