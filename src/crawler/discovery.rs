//! Region discovery
//!
//! Builds the region work list from a directory index page: every link
//! matching the configured selector becomes one region, named by its link text.

use crate::config::DiscoveryConfig;
use crate::crawler::fetcher::RateLimitedFetcher;
use crate::crawler::selector::{extract_regions, parse_selector};
use crate::state::{CheckpointStore, RegionCheckpoint};
use crate::Result;

/// Fetches the directory index, extracts its regions and writes the work list
///
/// The existing work list is replaced. The completed set is left untouched.
///
/// # Arguments
///
/// * `fetcher` - The rate-limited fetcher
/// * `config` - Directory URL and region-link selector
/// * `checkpoints` - Where the work list is written
///
/// # Returns
///
/// * `Ok(Vec<RegionCheckpoint>)` - The regions written, in page order
/// * `Err(HarvestError)` - The index page failed to fetch or the file failed to write
pub async fn discover_regions(
    fetcher: &mut RateLimitedFetcher,
    config: &DiscoveryConfig,
    checkpoints: &CheckpointStore,
) -> Result<Vec<RegionCheckpoint>> {
    let selector = parse_selector("region_link", &config.region_link)?;

    tracing::info!(url = %config.directory_url, "Discovering regions");
    let page = fetcher.fetch(&config.directory_url).await?;

    let regions = extract_regions(&page.body, &page.url, &selector);
    if regions.is_empty() {
        tracing::warn!(url = %page.url, "No regions found on directory page");
    }

    checkpoints.write_regions(&regions)?;
    tracing::info!(
        "Wrote {} regions to {}",
        regions.len(),
        checkpoints.regions_path().display()
    );

    Ok(regions)
}
