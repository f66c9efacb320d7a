//! URL handling module for Directory-Harvest
//!
//! Pacing keys for the rate-limited fetcher and link resolution for the
//! extractor.

mod domain;
mod link;

pub use domain::domain_key;
pub use link::resolve_link;
