//! Output module for reporting harvest progress
//!
//! This module handles:
//! - Counting stored documents per collection
//! - Reporting completed and pending regions

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};
