//! Output module for round reports
//!
//! This module prints what a round produced:
//! - Round statistics (attempts, downloads, failures by kind)
//! - The desired link listing

mod report;
mod stats;

pub use report::{format_link_line, print_links};
pub use stats::{print_statistics, RoundStatistics};
