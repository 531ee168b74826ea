use crate::crawler::BodyStream;
use crate::storage::{FileSink, WriteError, WriteResult};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Writes downloads to the local filesystem
#[derive(Debug, Clone, Default)]
pub struct FsSink;

impl FsSink {
    pub fn new() -> Self {
        Self
    }

    async fn copy_body(path: &Path, mut body: BodyStream) -> WriteResult<u64> {
        let io_err = |source| WriteError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).await.map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        let mut written = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|source| WriteError::Body {
                path: path.to_path_buf(),
                source,
            })?;
            writer.write_all(&chunk).await.map_err(io_err)?;
            written += chunk.len() as u64;
        }

        writer.flush().await.map_err(io_err)?;
        Ok(written)
    }
}

#[async_trait]
impl FileSink for FsSink {
    async fn write_stream(&self, path: &Path, body: BodyStream) -> WriteResult<u64> {
        let result = Self::copy_body(path, body).await;

        if result.is_err() {
            // Don't leave a truncated file behind for the next attempt to trip over
            if let Err(e) = tokio::fs::remove_file(path).await {
                tracing::trace!("No partial file to remove at {}: {}", path.display(), e);
            }
        }

        result
    }
}
