//! Filter pipeline for links and downloads
//!
//! Filters are pure predicates. A chain with no filters accepts everything; a
//! non-empty chain accepts a candidate if **any** filter accepts it, so adding
//! filters only ever widens what a chain lets through.

mod download;
mod link;

pub use download::{MimeFilter, PREDEFINED_MIME};
pub use link::{DomainFilter, RegexFilter, TitleFilter, WildcardFilter};

use crate::crawler::Link;
use reqwest::header::HeaderMap;
use std::fmt;
use std::sync::Arc;

/// Decides whether a discovered link is worth fetching
pub trait LinkFilter: Send + Sync {
    /// Returns true if the link is desired
    fn is_desired(&self, link: &Link) -> bool;
}

/// Decides whether a non-HTML response should be saved to disk
pub trait DownloadFilter: Send + Sync {
    /// Returns true if a response with these headers is desired
    fn is_desired(&self, headers: &HeaderMap) -> bool;
}

/// An ordered set of filters evaluated with OR semantics
///
/// Cloning is cheap: filters are shared behind `Arc`.
pub struct FilterChain<F: ?Sized> {
    filters: Vec<Arc<F>>,
}

impl<F: ?Sized> FilterChain<F> {
    /// Creates an empty chain, which accepts everything
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Creates a chain from the given filters
    pub fn from_filters(filters: Vec<Arc<F>>) -> Self {
        Self { filters }
    }

    /// Replaces the whole chain with `filters`
    pub fn replace(&mut self, filters: Vec<Arc<F>>) {
        self.filters = filters;
    }

    /// Removes every filter
    pub fn clear(&mut self) {
        self.filters.clear();
    }

    /// Returns the number of filters
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns true if the chain holds no filters
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Returns true if the chain is empty or `accepts` holds for any filter
    fn any(&self, mut accepts: impl FnMut(&F) -> bool) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|f| accepts(&**f))
    }
}

impl FilterChain<dyn LinkFilter> {
    /// Authoritative accept/reject pass for a link
    pub fn is_desired(&self, link: &Link) -> bool {
        self.any(|f| f.is_desired(link))
    }

    /// Invokes every filter on a freshly discovered link, discarding the results
    ///
    /// Filters may keep state between calls, so each one sees every discovered
    /// link once here and again when the next round starts.
    pub fn observe(&self, link: &Link) {
        for filter in &self.filters {
            let desired = filter.is_desired(link);
            tracing::trace!("Discovery-time filter result for {}: {}", link.url(), desired);
        }
    }
}

impl FilterChain<dyn DownloadFilter> {
    /// Returns true if a response with these headers should be saved
    pub fn is_desired(&self, headers: &HeaderMap) -> bool {
        self.any(|f| f.is_desired(headers))
    }
}

impl<F: ?Sized> Default for FilterChain<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> Clone for FilterChain<F> {
    fn clone(&self) -> Self {
        Self {
            filters: self.filters.clone(),
        }
    }
}

impl<F: ?Sized> fmt::Debug for FilterChain<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("len", &self.filters.len())
            .finish()
    }
}

/// Chain of link filters
pub type LinkFilterChain = FilterChain<dyn LinkFilter>;

/// Chain of download filters
pub type DownloadFilterChain = FilterChain<dyn DownloadFilter>;
