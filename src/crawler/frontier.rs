//! Frontier store: the deduplicated set of known links
//!
//! The frontier is rebuilt at the start of every round from the links that
//! pass the link filter chain. Links rejected by every filter are dropped for
//! good; they only come back if something adds them again.

use crate::filter::LinkFilterChain;
use std::collections::{HashSet, VecDeque};

/// A hyperlink known to the crawler
///
/// Identified by its absolute URL; carries the anchor markup it was found in
/// so filters and reports can look at the link text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    url: String,
    text: String,
    markup: String,
}

impl Link {
    /// Creates a link with no markup, e.g. a seed typed by the user
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: String::new(),
            markup: String::new(),
        }
    }

    /// Creates a link found inside an anchor element
    pub fn with_markup(
        url: impl Into<String>,
        text: impl Into<String>,
        markup: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
            markup: markup.into(),
        }
    }

    /// The absolute URL, which is also the link's identity
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Inner HTML of the anchor
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Outer HTML of the anchor
    pub fn markup(&self) -> &str {
        &self.markup
    }
}

/// Deduplicated, insertion-ordered set of links
#[derive(Debug, Default)]
pub struct Frontier {
    links: Vec<Link>,
    known: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a link unless its URL is already known
    ///
    /// Every filter in `filters` is invoked on a new link before it is stored;
    /// the verdicts are discarded; the accept/reject decision happens in
    /// [`Frontier::begin_round`].
    ///
    /// Returns true if the link was inserted.
    pub fn add_link(&mut self, link: Link, filters: &LinkFilterChain) -> bool {
        if self.known.contains(link.url()) {
            return false;
        }

        filters.observe(&link);
        self.known.insert(link.url.clone());
        self.links.push(link);
        true
    }

    /// Keeps only links accepted by `filters` and returns them as the pending queue
    ///
    /// The survivors, in discovery order, become both the new frontier and the
    /// queue of links to fetch this round.
    pub fn begin_round(&mut self, filters: &LinkFilterChain) -> VecDeque<Link> {
        let before = self.links.len();
        self.links.retain(|link| filters.is_desired(link));
        self.known = self.links.iter().map(|link| link.url.clone()).collect();

        tracing::debug!(
            "Frontier filtered for new round: {} of {} links kept",
            self.links.len(),
            before
        );

        self.links.iter().cloned().collect()
    }

    /// Returns every known link
    pub fn snapshot(&self) -> Vec<Link> {
        self.links.clone()
    }

    /// Returns the known links `filters` would accept, without changing anything
    pub fn desired_snapshot(&self, filters: &LinkFilterChain) -> Vec<Link> {
        self.links
            .iter()
            .filter(|link| filters.is_desired(link))
            .cloned()
            .collect()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.known.contains(url)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn clear(&mut self) {
        self.links.clear();
        self.known.clear();
    }
}
