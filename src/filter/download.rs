//! Download filters matched against response headers

use crate::filter::DownloadFilter;
use reqwest::header::{HeaderMap, CONTENT_TYPE};

/// Short aliases accepted by the `mime` command
pub const PREDEFINED_MIME: &[(&str, &str)] = &[
    ("MP3", "audio/"),
    ("APP", "application/"),
    ("IMG", "image/"),
];

/// Accepts responses whose Content-Type starts with a prefix
#[derive(Debug, Clone)]
pub struct MimeFilter {
    prefix: String,
}

impl MimeFilter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Builds a filter from user input, expanding the predefined aliases
    pub fn from_alias(input: &str) -> Self {
        let prefix = PREDEFINED_MIME
            .iter()
            .find(|(alias, _)| *alias == input)
            .map(|(_, prefix)| *prefix)
            .unwrap_or(input);
        Self::new(prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl DownloadFilter for MimeFilter {
    fn is_desired(&self, headers: &HeaderMap) -> bool {
        headers
            .get_all(CONTENT_TYPE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(|value| value.starts_with(&self.prefix))
    }
}
