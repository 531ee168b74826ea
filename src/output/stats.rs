//! Per-round crawl statistics
//!
//! The dispatcher fills one `RoundStatistics` per round under its lock; the
//! shell prints the snapshot once the round completes.

use crate::state::FailureKind;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Counters for a single round
#[derive(Debug, Clone)]
pub struct RoundStatistics {
    /// Round number, starting at 1 for the first `go`
    pub round: u64,

    /// When the round started
    pub started_at: DateTime<Utc>,

    /// When the round reached quiescence, if it has
    pub finished_at: Option<DateTime<Utc>>,

    /// Links that survived the filter pass at round start
    pub seeded: usize,

    /// Fetch attempts started, retries included
    pub attempts: u64,

    /// HTML pages fetched and parsed
    pub pages_parsed: u64,

    /// New links added to the frontier
    pub links_discovered: u64,

    /// Downloads written to disk
    pub files_saved: u64,

    /// Bytes written across all downloads
    pub bytes_saved: u64,

    /// Non-HTML responses no download filter wanted
    pub skipped: u64,

    /// Failed downloads put back on the retry queue
    pub retries_queued: u64,

    /// Downloads given up on after the last retry
    pub downloads_dropped: u64,

    /// Highest number of tasks in flight at once
    pub peak_in_flight: usize,

    /// Failed attempts by kind
    pub failures: HashMap<FailureKind, u64>,
}

impl RoundStatistics {
    /// Creates empty statistics for `round`, started now
    pub fn new(round: u64) -> Self {
        Self {
            round,
            started_at: Utc::now(),
            finished_at: None,
            seeded: 0,
            attempts: 0,
            pages_parsed: 0,
            links_discovered: 0,
            files_saved: 0,
            bytes_saved: 0,
            skipped: 0,
            retries_queued: 0,
            downloads_dropped: 0,
            peak_in_flight: 0,
            failures: HashMap::new(),
        }
    }

    pub fn record_failure(&mut self, kind: FailureKind) {
        *self.failures.entry(kind).or_insert(0) += 1;
    }

    pub fn failure_count(&self, kind: FailureKind) -> u64 {
        self.failures.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_failures(&self) -> u64 {
        self.failures.values().sum()
    }

    /// Marks the round finished; later calls keep the first timestamp
    pub fn finish(&mut self) {
        if self.finished_at.is_none() {
            self.finished_at = Some(Utc::now());
        }
    }

    /// Time from start to quiescence, or until now while still running
    pub fn duration(&self) -> Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }
}

impl Default for RoundStatistics {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RoundStatistics) {
    println!("=== Round {} Statistics ===\n", stats.round);

    println!("Overview:");
    println!("  Links queued at start: {}", stats.seeded);
    println!("  Fetch attempts: {}", stats.attempts);
    println!("  Pages parsed: {}", stats.pages_parsed);
    println!("  New links discovered: {}", stats.links_discovered);
    println!("  Peak in flight: {}", stats.peak_in_flight);
    println!(
        "  Duration: {:.2}s",
        stats.duration().num_milliseconds() as f64 / 1000.0
    );
    println!();

    println!("Downloads:");
    println!("  Files saved: {} ({} bytes)", stats.files_saved, stats.bytes_saved);
    println!("  Skipped: {}", stats.skipped);
    println!("  Retries queued: {}", stats.retries_queued);
    println!("  Dropped after retries: {}", stats.downloads_dropped);
    println!();

    if !stats.failures.is_empty() {
        println!("Error Summary:");
        for kind in FailureKind::all() {
            let count = stats.failure_count(kind);
            if count > 0 {
                println!("  {}: {}", kind, count);
            }
        }
        println!();
    }

    let succeeded = stats.attempts.saturating_sub(stats.total_failures());
    let success_rate = if stats.attempts > 0 {
        (succeeded as f64 / stats.attempts as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} attempts)",
        success_rate, succeeded, stats.attempts
    );
}
