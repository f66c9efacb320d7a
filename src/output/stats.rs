//! Statistics from the document store and the checkpoint files
//!
//! This module provides functionality for extracting and displaying harvest
//! progress: documents per collection and regions completed versus pending.

use crate::state::CheckpointStore;
use crate::storage::DocumentStore;
use crate::Result;

/// Harvest statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestStatistics {
    /// Document count per collection, in the order requested
    pub collections: Vec<(String, u64)>,

    /// Regions in the work list
    pub regions_total: usize,

    /// Regions in the completed set
    pub regions_completed: usize,

    /// Work-list regions not completed yet, in work-list order
    pub pending_regions: Vec<String>,
}

impl HarvestStatistics {
    /// Total documents across the counted collections
    pub fn total_documents(&self) -> u64 {
        self.collections.iter().map(|(_, count)| count).sum()
    }
}

/// Loads statistics from the store and the checkpoint files
///
/// # Arguments
///
/// * `store` - The document store to query
/// * `collections` - Collections to count
/// * `checkpoints` - The work list and completed set
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - A count or a checkpoint file failed to load
pub fn load_statistics<S: DocumentStore>(
    store: &S,
    collections: &[&str],
    checkpoints: &CheckpointStore,
) -> Result<HarvestStatistics> {
    let mut counts = Vec::with_capacity(collections.len());
    for collection in collections {
        counts.push((collection.to_string(), store.count(collection)?));
    }

    let regions = checkpoints.load_regions()?;
    let completed = checkpoints.load_completed()?;

    let pending_regions = regions
        .iter()
        .filter(|r| !completed.contains(&r.region_name))
        .map(|r| r.region_name.clone())
        .collect();

    Ok(HarvestStatistics {
        collections: counts,
        regions_total: regions.len(),
        regions_completed: completed.len(),
        pending_regions,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Documents:");
    for (collection, count) in &stats.collections {
        println!("  {}: {}", collection, count);
    }
    println!("  Total: {}", stats.total_documents());
    println!();

    let progress = if stats.regions_total > 0 {
        let done = stats.regions_total - stats.pending_regions.len();
        (done as f64 / stats.regions_total as f64) * 100.0
    } else {
        0.0
    };

    println!("Regions:");
    println!("  In work list: {}", stats.regions_total);
    println!("  Completed: {}", stats.regions_completed);
    println!("  Pending: {} ({:.1}% done)", stats.pending_regions.len(), progress);

    if !stats.pending_regions.is_empty() {
        println!();
        println!("Pending Regions:");
        for region in &stats.pending_regions {
            println!("  - {}", region);
        }
    }
}
