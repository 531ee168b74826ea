//! In-memory collaborators for dispatcher and task tests

use crate::crawler::fetcher::{read_body, FetchResponse, Transport};
use crate::crawler::BodyStream;
use crate::storage::{FileSink, WriteError, WriteResult};
use crate::TransportError;
use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Clone)]
enum Route {
    Respond {
        status: u16,
        content_type: Option<String>,
        body: Vec<u8>,
    },
    Fail(TransportError),
}

/// Transport serving canned responses; unknown URLs get a 404
#[derive(Default)]
pub struct FakeTransport {
    routes: HashMap<String, Route>,
    delay: Duration,
    active: AtomicUsize,
    peak: AtomicUsize,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn html(self, url: &str, body: &str) -> Self {
        self.file(url, "text/html; charset=utf-8", body.as_bytes().to_vec())
    }

    pub fn file(mut self, url: &str, content_type: &str, body: Vec<u8>) -> Self {
        self.routes.insert(
            url.to_string(),
            Route::Respond {
                status: 200,
                content_type: Some(content_type.to_string()),
                body,
            },
        );
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.routes.insert(
            url.to_string(),
            Route::Respond {
                status,
                content_type: None,
                body: Vec::new(),
            },
        );
        self
    }

    pub fn fail(mut self, url: &str, error: TransportError) -> Self {
        self.routes.insert(url.to_string(), Route::Fail(error));
        self
    }

    /// Makes every request take `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Highest number of requests that were waiting at once
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|r| r.as_str() == url).count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, TransportError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.requests.lock().unwrap().push(url.to_string());

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let route = self.routes.get(url).cloned().unwrap_or(Route::Respond {
            status: 404,
            content_type: None,
            body: Vec::new(),
        });

        match route {
            Route::Respond {
                status,
                content_type,
                body,
            } => {
                let mut headers = HeaderMap::new();
                if let Some(content_type) = content_type {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_str(&content_type).unwrap());
                }
                Ok(FetchResponse {
                    status,
                    headers,
                    body: body_of(body),
                })
            }
            Route::Fail(error) => Err(error),
        }
    }
}

pub fn body_of(bytes: Vec<u8>) -> BodyStream {
    stream::iter(vec![Ok(bytes)]).boxed()
}

/// Sink keeping downloads in memory, or failing every write
#[derive(Default)]
pub struct MemorySink {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    writes: AtomicUsize,
    fail: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn file(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    /// Number of writes attempted, failed ones included
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileSink for MemorySink {
    async fn write_stream(&self, path: &Path, body: BodyStream) -> WriteResult<u64> {
        self.writes.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(WriteError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            });
        }

        let bytes = read_body(body).await.map_err(|source| WriteError::Body {
            path: path.to_path_buf(),
            source,
        })?;
        let len = bytes.len() as u64;
        self.files.lock().unwrap().insert(path.to_path_buf(), bytes);
        Ok(len)
    }
}
