//! Link filters selectable from the command shell

use crate::crawler::Link;
use crate::filter::LinkFilter;
use crate::url::matches_wildcard;
use regex::Regex;

/// Accepts links whose URL contains the given domain text
#[derive(Debug, Clone)]
pub struct DomainFilter {
    domain: String,
}

impl DomainFilter {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }
}

impl LinkFilter for DomainFilter {
    fn is_desired(&self, link: &Link) -> bool {
        link.url().contains(&self.domain)
    }
}

/// Accepts links whose URL contains a match of the pattern anywhere
#[derive(Debug, Clone)]
pub struct RegexFilter {
    pattern: Regex,
}

impl RegexFilter {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }
}

impl LinkFilter for RegexFilter {
    fn is_desired(&self, link: &Link) -> bool {
        self.pattern.is_match(link.url())
    }
}

/// Accepts links whose anchor markup fully matches the pattern
///
/// Links without any markup, such as seeds, are always accepted.
#[derive(Debug, Clone)]
pub struct TitleFilter {
    pattern: Regex,
}

impl TitleFilter {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(&format!("^(?:{})$", pattern))?,
        })
    }
}

impl LinkFilter for TitleFilter {
    fn is_desired(&self, link: &Link) -> bool {
        let markup = link.markup().trim();
        markup.is_empty() || self.pattern.is_match(markup)
    }
}

/// Accepts links whose whole URL matches a `*`/`?` glob
#[derive(Debug, Clone)]
pub struct WildcardFilter {
    pattern: String,
}

impl WildcardFilter {
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.trim().to_string(),
        }
    }

    /// Builds a filter matching URLs that contain `fragment` anywhere
    pub fn containing(fragment: &str) -> Self {
        Self::new(&format!("*{}*", fragment.trim()))
    }
}

impl LinkFilter for WildcardFilter {
    fn is_desired(&self, link: &Link) -> bool {
        matches_wildcard(&self.pattern, link.url())
    }
}
