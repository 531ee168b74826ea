//! Crawler module for round-based fetching
//!
//! This module contains the dispatch engine, including:
//! - The frontier of known links
//! - HTTP fetching through a pooled transport
//! - HTML link extraction
//! - Fetch tasks and the bounded-concurrency dispatcher
//! - The round controller tying them together

mod coordinator;
mod dispatcher;
mod fetcher;
mod frontier;
mod parser;
mod pool;
mod task;

#[cfg(test)]
pub(crate) mod testing;

pub use coordinator::Coordinator;
pub use dispatcher::{DispatchLimits, DispatchState, Dispatcher, RoundCallback};
pub use fetcher::{
    build_http_client, read_body, BodyStream, FetchResponse, ReqwestTransport, Transport,
};
pub use frontier::{Frontier, Link};
pub use parser::{decode_html, HtmlLinkExtractor, LinkExtractor, ParseError, RawLink};
pub use pool::{Pool, Pooled};
pub use task::{Collaborators, Completion, FetchTask, TaskId, TaskOutcome, TaskPlan};
