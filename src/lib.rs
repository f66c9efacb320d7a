//! Directory-Harvest: an incremental business-directory harvester
//!
//! This crate walks paginated directory listings region by region, turns each
//! listed company into a normalized record, classifies it into an industry and
//! loads it into a document store. Completed regions are checkpointed so an
//! interrupted run resumes where it stopped, and company writes are gated by
//! name so re-processing a region never duplicates stored companies.

pub mod classifier;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Storage error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] state::CheckpointError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] classifier::ClassifierError),

    #[error("Invalid transition for region {region}: {from:?} -> {to:?}")]
    InvalidTransition {
        region: String,
        from: state::RegionState,
        to: state::RegionState,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),
}

/// Page fetch errors
///
/// A fetch is never retried: the error goes back to the caller, which decides
/// whether the failure is fatal for the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: ::url::ParseError,
    },

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request to {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use classifier::{KeywordClassifier, KeywordTable, Signal, UNKNOWN_CATEGORY};
pub use config::Config;
pub use crawler::{CrawlOrchestrator, Extractor, RateLimitedFetcher, SelectorExtractor};
pub use state::{CheckpointStore, RegionCheckpoint, RegionState};
pub use storage::{BufferedDedupWriter, DocumentStore, SqliteDocumentStore};
