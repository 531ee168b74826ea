//! Configuration module for Roundcrawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so running without a file is the same as loading
//! an empty one.
//!
//! # Example
//!
//! ```no_run
//! use roundcrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("roundcrawl.toml")).unwrap();
//! println!("Up to {} fetches in flight", config.crawler.max_concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
