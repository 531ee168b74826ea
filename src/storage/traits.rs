//! Storage traits and error types
//!
//! The dispatcher only decides whether and where a download is written; the
//! sink behind this trait does the writing.

use crate::crawler::BodyStream;
use crate::TransportError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while persisting a download
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Body of {} could not be read: {source}", path.display())]
    Body {
        path: PathBuf,
        #[source]
        source: TransportError,
    },
}

impl WriteError {
    /// Path the failed write was aimed at
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::Body { path, .. } => path,
        }
    }
}

/// Result type for storage operations
pub type WriteResult<T> = Result<T, WriteError>;

/// Trait for download sink implementations
///
/// Implementations must be shareable across concurrently running fetch tasks.
#[async_trait]
pub trait FileSink: Send + Sync {
    /// Streams `body` into `path`, returning the number of bytes written
    async fn write_stream(&self, path: &Path, body: BodyStream) -> WriteResult<u64>;
}
