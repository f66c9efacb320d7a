use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Directory-Harvest
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub files: FilesConfig,
    pub location: LocationConfig,
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub discovery: Option<DiscoveryConfig>,
}

/// Outbound request pacing and identity
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetcherConfig {
    /// Minimum time between requests to the same domain (milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound of base delay plus jitter (milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Identities rotated through the User-Agent header; empty uses the built-in pool
    #[serde(default)]
    pub user_agents: Vec<String>,
}

impl FetcherConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            timeout_secs: default_timeout_secs(),
            user_agents: Vec::new(),
        }
    }
}

/// Crawl loop behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Lower bound of the pause before each detail page and next-page link (milliseconds)
    #[serde(default = "default_min_pause_ms")]
    pub min_pause_ms: u64,

    /// Upper bound of that pause (milliseconds)
    #[serde(default = "default_max_pause_ms")]
    pub max_pause_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            min_pause_ms: default_min_pause_ms(),
            max_pause_ms: default_max_pause_ms(),
        }
    }
}

/// Document store location and writer thresholds
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    #[serde(default = "default_company_collection")]
    pub company_collection: String,

    #[serde(default = "default_location_collection")]
    pub location_collection: String,

    #[serde(default = "default_industry_collection")]
    pub industry_collection: String,

    /// Buffered company records that trigger a flush
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Age of the last flush that triggers the next one (seconds)
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,
}

impl StoreConfig {
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            company_collection: default_company_collection(),
            location_collection: default_location_collection(),
            industry_collection: default_industry_collection(),
            buffer_size: default_buffer_size(),
            max_wait_secs: default_max_wait_secs(),
        }
    }
}

/// Files read and written around a run
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FilesConfig {
    /// Work list: JSON object `region_name -> entry_url`
    pub regions: PathBuf,

    /// Resume set, same shape as the work list
    pub completed_regions: PathBuf,

    /// JSON object `category -> [keyword, ...]`
    pub keyword_table: PathBuf,

    /// Optional JSON object `region_name -> state`
    #[serde(default)]
    pub region_states: Option<PathBuf>,
}

/// Values stamped on every location record
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LocationConfig {
    pub country: String,
}

/// A CSS selector plus where to read the value from
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldSelector {
    pub selector: String,

    /// Attribute to read; the element's text when absent
    #[serde(default)]
    pub attr: Option<String>,
}

impl FieldSelector {
    pub fn text(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            attr: None,
        }
    }

    pub fn attr(selector: impl Into<String>, attr: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            attr: Some(attr.into()),
        }
    }
}

/// Selectors for the generic selector-driven extractor
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExtractorConfig {
    /// Links to company detail pages on a listing page (href is read)
    pub detail_link: String,

    /// Link to the next listing page (href is read)
    #[serde(default)]
    pub next_page: Option<String>,

    pub name: FieldSelector,
    #[serde(default)]
    pub address: Option<FieldSelector>,
    #[serde(default)]
    pub size: Option<FieldSelector>,
    #[serde(default)]
    pub website: Option<FieldSelector>,
    #[serde(default)]
    pub description: Option<FieldSelector>,
    #[serde(default)]
    pub latitude: Option<FieldSelector>,
    #[serde(default)]
    pub longitude: Option<FieldSelector>,

    /// Every match becomes one contact number
    #[serde(default)]
    pub contact_numbers: Option<FieldSelector>,

    /// Every match becomes one tag
    #[serde(default)]
    pub tags: Option<FieldSelector>,
}

/// Region discovery from a directory index page
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DiscoveryConfig {
    /// Page listing every region of the directory
    pub directory_url: String,

    /// Region links on that page; link text is the region name
    pub region_link: String,
}

fn default_base_delay_ms() -> u64 {
    3000
}

fn default_max_delay_ms() -> u64 {
    7000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_min_pause_ms() -> u64 {
    1000
}

fn default_max_pause_ms() -> u64 {
    3000
}

fn default_database_path() -> PathBuf {
    PathBuf::from("harvest.db")
}

fn default_company_collection() -> String {
    "companies".to_string()
}

fn default_location_collection() -> String {
    "locations".to_string()
}

fn default_industry_collection() -> String {
    "industries".to_string()
}

fn default_buffer_size() -> usize {
    100
}

fn default_max_wait_secs() -> u64 {
    60
}
