//! Crawler coordinator - the round controller
//!
//! This is the public face of the dispatch engine. It owns the dispatcher and
//! its event loop task, and exposes:
//! - Seeding the frontier
//! - Installing link and download filters
//! - Choosing where downloads go
//! - Starting, stopping and resetting rounds
//! - Snapshots of links, statistics and progress

use crate::config::Config;
use crate::crawler::dispatcher::{DispatchLimits, Dispatcher, RoundCallback};
use crate::crawler::fetcher::ReqwestTransport;
use crate::crawler::parser::HtmlLinkExtractor;
use crate::crawler::task::Collaborators;
use crate::crawler::Link;
use crate::filter::{DownloadFilter, LinkFilter};
use crate::output::RoundStatistics;
use crate::state::DispatchPhase;
use crate::storage::FsSink;
use crate::CrawlError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Round controller for an interactive crawl
///
/// Must be created from within a tokio runtime; fetch tasks and the
/// dispatcher event loop are spawned onto it. Dropping the coordinator stops
/// the crawl.
pub struct Coordinator {
    dispatcher: Arc<Dispatcher>,
    event_loop: JoinHandle<()>,
    default_output_dir: PathBuf,
}

impl Coordinator {
    /// Creates a coordinator fetching over HTTP and saving to the filesystem
    ///
    /// `on_round_complete` is invoked once each time a round finishes.
    pub fn new(
        config: &Config,
        on_round_complete: impl Fn() + Send + Sync + 'static,
    ) -> Result<Self, CrawlError> {
        let collaborators = Collaborators::new(
            Arc::new(ReqwestTransport::new(config)),
            Arc::new(HtmlLinkExtractor),
            Arc::new(FsSink::new()),
        );
        Self::with_collaborators(config, collaborators, on_round_complete)
    }

    /// Creates a coordinator with caller-supplied collaborators
    pub fn with_collaborators(
        config: &Config,
        collaborators: Collaborators,
        on_round_complete: impl Fn() + Send + Sync + 'static,
    ) -> Result<Self, CrawlError> {
        let runtime = Handle::try_current()?;
        let default_output_dir = PathBuf::from(&config.output.save_dir);
        let callback: RoundCallback = Arc::new(on_round_complete);

        let limits = DispatchLimits {
            max_concurrency: config.crawler.max_concurrency,
            max_retries: config.crawler.max_retries,
        };
        let (dispatcher, receiver) = Dispatcher::new(
            limits,
            collaborators,
            default_output_dir.clone(),
            runtime.clone(),
            callback,
        );
        let event_loop = runtime.spawn(Arc::clone(&dispatcher).run(receiver));

        tracing::debug!(
            "Coordinator ready: max {} in flight, downloads to {}",
            limits.max_concurrency,
            default_output_dir.display()
        );

        Ok(Self {
            dispatcher,
            event_loop,
            default_output_dir,
        })
    }

    /// Adds a link to the frontier; known URLs are ignored
    ///
    /// Returns true if the link was new.
    pub fn add_link(&self, link: Link) -> bool {
        self.dispatcher
            .with_state(|state| state.frontier.add_link(link, &state.link_filters))
    }

    /// Adds a seed URL typed by the user
    pub fn add_seed(&self, url: &str) -> bool {
        self.add_link(Link::new(url.trim()))
    }

    /// Replaces the link filter chain with a single filter
    pub fn add_filter(&self, filter: Arc<dyn LinkFilter>) {
        self.set_link_filters(vec![filter]);
    }

    /// Replaces the link filter chain; the filters are OR'd together
    pub fn set_link_filters(&self, filters: Vec<Arc<dyn LinkFilter>>) {
        tracing::debug!("Installing {} link filters", filters.len());
        self.dispatcher
            .with_state(|state| state.link_filters.replace(filters));
    }

    /// Replaces the download filter chain with a single filter
    pub fn add_download_filter(&self, filter: Arc<dyn DownloadFilter>) {
        self.set_download_filters(vec![filter]);
    }

    /// Replaces the download filter chain; the filters are OR'd together
    pub fn set_download_filters(&self, filters: Vec<Arc<dyn DownloadFilter>>) {
        tracing::debug!("Installing {} download filters", filters.len());
        self.dispatcher
            .with_state(|state| state.download_filters.replace(filters));
    }

    pub fn clear_link_filters(&self) {
        self.dispatcher.with_state(|state| state.link_filters.clear());
    }

    pub fn clear_download_filters(&self) {
        self.dispatcher
            .with_state(|state| state.download_filters.clear());
    }

    /// Sets the directory downloads are written to
    ///
    /// The directory must already exist; otherwise the current one is kept.
    pub fn set_output_dir(&self, dir: impl AsRef<Path>) -> Result<(), CrawlError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(CrawlError::MissingOutputDir {
                path: dir.to_path_buf(),
            });
        }

        tracing::info!("Downloads will be saved to {}", dir.display());
        self.dispatcher
            .with_state(|state| state.output_dir = dir.to_path_buf());
        Ok(())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dispatcher.with_state(|state| state.output_dir.clone())
    }

    /// Starts the next round with the current frontier and filters
    ///
    /// Returns false if a round is already running.
    pub fn go(&self) -> bool {
        self.dispatcher.start_round()
    }

    /// Aborts the running round and clears links, queues and filters
    pub fn stop(&self) {
        self.dispatcher.stop();
    }

    /// Stops, then restores the configured output directory
    pub fn reset(&self) {
        self.dispatcher.stop();
        self.dispatcher
            .with_state(|state| state.output_dir = self.default_output_dir.clone());
    }

    /// Every link in the frontier, in discovery order
    pub fn links(&self) -> Vec<Link> {
        self.dispatcher.with_state(|state| state.frontier.snapshot())
    }

    /// The frontier links the current link filters accept
    pub fn desired_links(&self) -> Vec<Link> {
        self.dispatcher
            .with_state(|state| state.frontier.desired_snapshot(&state.link_filters))
    }

    /// Statistics of the current or most recent round
    pub fn round_statistics(&self) -> RoundStatistics {
        self.dispatcher.with_state(|state| state.stats.clone())
    }

    pub fn phase(&self) -> DispatchPhase {
        self.dispatcher.with_state(|state| state.phase)
    }

    /// Number of fetch tasks currently running
    pub fn in_flight(&self) -> usize {
        self.dispatcher.with_state(|state| state.in_flight.len())
    }

    pub fn frontier_len(&self) -> usize {
        self.dispatcher.with_state(|state| state.frontier.len())
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.dispatcher.stop();
        self.event_loop.abort();
    }
}
