//! Storage module for persisting downloads
//!
//! This module provides the file sink collaborator: the `FileSink` trait the
//! fetch task writes through, and `FsSink`, its filesystem implementation.

mod fs;
mod traits;

pub use fs::FsSink;
pub use traits::{FileSink, WriteError, WriteResult};

use std::path::{Path, PathBuf};

/// Builds the destination path for a download inside `dir`
///
/// # Examples
///
/// ```
/// use roundcrawl::storage::download_path;
/// use std::path::Path;
///
/// let path = download_path(Path::new("/tmp/out"), "http://x.test/f.zip");
/// assert_eq!(path, Path::new("/tmp/out/f.zip"));
/// ```
pub fn download_path(dir: &Path, link: &str) -> PathBuf {
    dir.join(crate::url::file_name_from_url(link))
}
