//! Page extraction contract
//!
//! An `Extractor` turns fetched pages into links and records. Implementations
//! are site-specific and never fail across this boundary: a page that does not
//! match the expected markup yields empty links or no record.

use crate::crawler::fetcher::FetchedPage;
use serde::{Deserialize, Serialize};

/// Links found on one listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingLinks {
    /// Absolute URL of the next listing page, if any
    pub next_page: Option<String>,

    /// Absolute URLs of company detail pages, in page order
    pub detail_links: Vec<String>,
}

/// A company as read from its detail page, before enrichment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyRecord {
    pub name: Option<String>,
    pub address: Option<String>,
    pub size: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub contact_numbers: Vec<String>,
    pub tags: Vec<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

impl CompanyRecord {
    /// The dedup key, if present and not blank
    pub fn dedup_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Site-specific page extraction
pub trait Extractor {
    /// Reads the detail links and the next-page link from a listing page
    fn extract_links(&self, page: &FetchedPage, region: &str) -> ListingLinks;

    /// Reads a company record from a detail page; `None` for placeholder pages
    fn extract_record(&self, page: &FetchedPage) -> Option<CompanyRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_name() {
        let mut record = CompanyRecord::default();
        assert_eq!(record.dedup_name(), None);

        record.name = Some("   ".to_string());
        assert_eq!(record.dedup_name(), None);

        record.name = Some(" Acme Ltd ".to_string());
        assert_eq!(record.dedup_name(), Some("Acme Ltd"));
    }

    #[test]
    fn test_partial_json_record() {
        let record: CompanyRecord =
            serde_json::from_str(r#"{"name": "Acme", "tags": ["software"]}"#).unwrap();
        assert_eq!(record.name.as_deref(), Some("Acme"));
        assert_eq!(record.tags, vec!["software"]);
        assert!(record.contact_numbers.is_empty());
        assert!(record.website.is_none());
    }
}
