//! HTTP transport implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - Drawing clients from the shared pool for each attempt
//! - Streaming response bodies with a per-read timeout
//! - Error classification

use crate::config::{Config, CrawlerConfig, UserAgentConfig};
use crate::crawler::pool::{Pool, Pooled};
use crate::TransportError;
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, ACCEPT_CHARSET, CONNECTION};
use reqwest::{redirect::Policy, Client, Response};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Response body, delivered in chunks as they arrive
pub type BodyStream = BoxStream<'static, Result<Vec<u8>, TransportError>>;

/// What the transport hands back for one request attempt
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderMap,
    /// Body stream; dropping it releases the underlying connection
    pub body: BodyStream,
}

impl fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Performs one GET request per call
///
/// Redirects are followed by the transport, never by the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, TransportError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use roundcrawl::config::Config;
/// use roundcrawl::crawler::build_http_client;
///
/// let config = Config::default();
/// let client = build_http_client(&config.crawler, &config.user_agent).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .connect_timeout(Duration::from_secs(crawler.connect_timeout_secs))
        .redirect(Policy::limited(crawler.max_redirects))
        // Only gzip is advertised in Accept-Encoding
        .gzip(true)
        .build()
}

/// Transport backed by a pool of `reqwest` clients
pub struct ReqwestTransport {
    pool: Arc<Pool<Client>>,
    crawler: CrawlerConfig,
    user_agent: UserAgentConfig,
}

impl ReqwestTransport {
    pub fn new(config: &Config) -> Self {
        Self {
            pool: Pool::new(config.crawler.max_concurrency),
            crawler: config.crawler.clone(),
            user_agent: config.user_agent.clone(),
        }
    }

    /// The client pool shared by all attempts
    pub fn pool(&self) -> &Arc<Pool<Client>> {
        &self.pool
    }

    fn connection_hint(&self) -> &'static str {
        if self.crawler.keep_alive {
            "keep-alive"
        } else {
            "close"
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, TransportError> {
        let parsed = Url::parse(url).map_err(|e| TransportError::MalformedUri {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(TransportError::MalformedUri {
                url: url.to_string(),
                message: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let client = self
            .pool
            .checkout(|| build_http_client(&self.crawler, &self.user_agent))
            .map_err(|e| TransportError::Unknown {
                url: url.to_string(),
                message: format!("failed to build client: {}", e),
            })?;

        let request = client
            .get(parsed)
            .header(ACCEPT_CHARSET, "utf-8")
            .header(CONNECTION, self.connection_hint());

        let read_timeout = Duration::from_secs(self.crawler.read_timeout_secs);
        let header_deadline = Duration::from_secs(self.crawler.connect_timeout_secs) + read_timeout;

        let response = match tokio::time::timeout(header_deadline, request.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(classify_error(url, &e)),
            Err(_) => {
                return Err(TransportError::SocketTimeout {
                    url: url.to_string(),
                })
            }
        };

        tracing::trace!("{} responded with {}", url, response.status());

        Ok(FetchResponse {
            status: response.status().as_u16(),
            headers: response.headers().clone(),
            body: body_stream(response, client, read_timeout, url.to_string()),
        })
    }
}

/// Wraps the response body so each read is bounded by `read_timeout`
///
/// The pooled client rides along with the stream and goes back to the pool
/// once the body is finished, fails, or is dropped unread.
fn body_stream(
    response: Response,
    client: Pooled<Client>,
    read_timeout: Duration,
    url: String,
) -> BodyStream {
    let chunks = Box::pin(response.bytes_stream());

    stream::unfold(Some((chunks, client)), move |state| {
        let url = url.clone();
        async move {
            let (mut chunks, client) = state?;
            match tokio::time::timeout(read_timeout, chunks.next()).await {
                Ok(Some(Ok(bytes))) => Some((Ok(bytes.to_vec()), Some((chunks, client)))),
                Ok(Some(Err(e))) => Some((Err(classify_error(&url, &e)), None)),
                Ok(None) => None,
                Err(_) => Some((Err(TransportError::SocketTimeout { url }), None)),
            }
        }
    })
    .boxed()
}

/// Maps a `reqwest` error onto the transport failure classes
fn classify_error(url: &str, e: &reqwest::Error) -> TransportError {
    let url = url.to_string();

    if e.is_timeout() {
        if e.is_connect() {
            TransportError::ConnectTimeout { url }
        } else {
            TransportError::SocketTimeout { url }
        }
    } else if e.is_builder() {
        TransportError::MalformedUri {
            url,
            message: e.to_string(),
        }
    } else if e.is_redirect() || e.is_status() {
        TransportError::Http {
            url,
            status: e.status().map(|s| s.as_u16()),
        }
    } else {
        TransportError::Unknown {
            url,
            message: e.to_string(),
        }
    }
}

/// Drains a body stream into memory
pub async fn read_body(mut body: BodyStream) -> Result<Vec<u8>, TransportError> {
    let mut buffer = Vec::new();
    while let Some(chunk) = body.next().await {
        buffer.extend_from_slice(&chunk?);
    }
    Ok(buffer)
}
