//! Configuration module for Directory-Harvest
//!
//! This module handles loading, parsing, and validating the TOML run
//! configuration: fetch pacing, store collections and thresholds, the
//! checkpoint and lookup files, and the extractor's CSS selectors.
//!
//! # Example
//!
//! ```no_run
//! use directory_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Company buffer size: {}", config.store.buffer_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DiscoveryConfig, ExtractorConfig, FetcherConfig, FieldSelector,
    FilesConfig, LocationConfig, StoreConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
