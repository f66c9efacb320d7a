//! Selector-driven extractor
//!
//! A generic `Extractor` configured entirely with CSS selectors. Link hrefs
//! are resolved against the page URL; javascript:, mailto:, tel: and data:
//! links are dropped.

use crate::config::{ExtractorConfig, FieldSelector};
use crate::crawler::extractor::{CompanyRecord, Extractor, ListingLinks};
use crate::crawler::fetcher::FetchedPage;
use crate::state::RegionCheckpoint;
use crate::url::resolve_link;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Parses a CSS selector, naming the config field on failure
pub fn parse_selector(field: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| {
        ConfigError::InvalidSelector(format!("{} selector '{}': {:?}", field, selector, e))
    })
}

/// A compiled field selector
#[derive(Debug, Clone)]
struct FieldReader {
    selector: Selector,
    attr: Option<String>,
}

impl FieldReader {
    fn compile(field: &str, config: &FieldSelector) -> Result<Self, ConfigError> {
        Ok(Self {
            selector: parse_selector(field, &config.selector)?,
            attr: config.attr.clone(),
        })
    }

    fn compile_opt(field: &str, config: Option<&FieldSelector>) -> Result<Option<Self>, ConfigError> {
        config.map(|c| Self::compile(field, c)).transpose()
    }

    fn read(&self, element: ElementRef<'_>) -> Option<String> {
        let value = match &self.attr {
            Some(attr) => element.value().attr(attr)?.to_string(),
            None => element.text().collect::<Vec<_>>().join(" "),
        };

        let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
        (!value.is_empty()).then_some(value)
    }

    /// First non-empty value
    fn first(&self, document: &Html) -> Option<String> {
        document.select(&self.selector).find_map(|el| self.read(el))
    }

    /// Every non-empty value, in document order
    fn all(&self, document: &Html) -> Vec<String> {
        document
            .select(&self.selector)
            .filter_map(|el| self.read(el))
            .collect()
    }
}

/// Extractor configured with CSS selectors
#[derive(Debug, Clone)]
pub struct SelectorExtractor {
    detail_link: Selector,
    next_page: Option<Selector>,
    name: FieldReader,
    address: Option<FieldReader>,
    size: Option<FieldReader>,
    website: Option<FieldReader>,
    description: Option<FieldReader>,
    latitude: Option<FieldReader>,
    longitude: Option<FieldReader>,
    contact_numbers: Option<FieldReader>,
    tags: Option<FieldReader>,
}

impl SelectorExtractor {
    /// Compiles every configured selector
    ///
    /// # Returns
    ///
    /// * `Ok(SelectorExtractor)` - All selectors parsed
    /// * `Err(ConfigError::InvalidSelector)` - A selector failed to parse
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            detail_link: parse_selector("detail_link", &config.detail_link)?,
            next_page: config
                .next_page
                .as_deref()
                .map(|s| parse_selector("next_page", s))
                .transpose()?,
            name: FieldReader::compile("name", &config.name)?,
            address: FieldReader::compile_opt("address", config.address.as_ref())?,
            size: FieldReader::compile_opt("size", config.size.as_ref())?,
            website: FieldReader::compile_opt("website", config.website.as_ref())?,
            description: FieldReader::compile_opt("description", config.description.as_ref())?,
            latitude: FieldReader::compile_opt("latitude", config.latitude.as_ref())?,
            longitude: FieldReader::compile_opt("longitude", config.longitude.as_ref())?,
            contact_numbers: FieldReader::compile_opt(
                "contact_numbers",
                config.contact_numbers.as_ref(),
            )?,
            tags: FieldReader::compile_opt("tags", config.tags.as_ref())?,
        })
    }
}

impl Extractor for SelectorExtractor {
    fn extract_links(&self, page: &FetchedPage, region: &str) -> ListingLinks {
        let document = Html::parse_document(&page.body);
        let mut seen = HashSet::new();

        let detail_links: Vec<String> = document
            .select(&self.detail_link)
            .filter_map(|el| el.value().attr("href"))
            .filter_map(|href| resolve_link(href, &page.url))
            .map(String::from)
            .filter(|link| seen.insert(link.clone()))
            .collect();

        let next_page = self.next_page.as_ref().and_then(|selector| {
            document
                .select(selector)
                .filter_map(|el| el.value().attr("href"))
                .find_map(|href| resolve_link(href, &page.url))
                .map(String::from)
        });

        if detail_links.is_empty() {
            tracing::debug!(region = %region, url = %page.url, "No detail links on listing page");
        }

        ListingLinks {
            next_page,
            detail_links,
        }
    }

    fn extract_record(&self, page: &FetchedPage) -> Option<CompanyRecord> {
        let document = Html::parse_document(&page.body);

        let Some(name) = self.name.first(&document) else {
            tracing::debug!(url = %page.url, "No company name on detail page");
            return None;
        };

        let first = |reader: &Option<FieldReader>| reader.as_ref().and_then(|r| r.first(&document));
        let all = |reader: &Option<FieldReader>| {
            reader
                .as_ref()
                .map(|r| r.all(&document))
                .unwrap_or_default()
        };

        Some(CompanyRecord {
            name: Some(name),
            address: first(&self.address),
            size: first(&self.size),
            website: first(&self.website),
            description: first(&self.description),
            contact_numbers: all(&self.contact_numbers),
            tags: all(&self.tags),
            latitude: first(&self.latitude),
            longitude: first(&self.longitude),
        })
    }
}

/// Reads `region name -> entry URL` pairs from a directory index page
///
/// The link text is the region name. Later links with an already seen name
/// are ignored.
pub fn extract_regions(body: &str, base_url: &Url, region_link: &Selector) -> Vec<RegionCheckpoint> {
    let document = Html::parse_document(body);
    let mut seen = HashSet::new();

    document
        .select(region_link)
        .filter_map(|el| {
            let name = el.text().collect::<Vec<_>>().join(" ");
            let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
            let url = resolve_link(el.value().attr("href")?, base_url)?;
            (!name.is_empty()).then(|| RegionCheckpoint::new(name, url.as_str()))
        })
        .filter(|region| seen.insert(region.region_name.clone()))
        .collect()
}
