//! Crawler module for fetching and walking directory listings
//!
//! This module contains the harvesting logic, including:
//! - Per-domain paced fetching with identity rotation
//! - The `Extractor` contract and a selector-driven implementation
//! - Region discovery from a directory index page
//! - The resumable region walk

mod discovery;
mod extractor;
mod fetcher;
mod identity;
mod orchestrator;
mod pacer;
mod selector;

pub use discovery::discover_regions;
pub use extractor::{CompanyRecord, Extractor, ListingLinks};
pub use fetcher::{build_http_client, FetchedPage, RateLimitedFetcher};
pub use identity::{IdentityPool, DEFAULT_USER_AGENTS};
pub use orchestrator::{CrawlOrchestrator, RunSummary};
pub use pacer::DomainPacer;
pub use selector::{extract_regions, parse_selector, SelectorExtractor};
