//! Integration tests for the harvester
//!
//! These tests use wiremock to serve directory listings and company pages and
//! run the full region walk end-to-end against an in-memory document store.

use directory_harvest::config::{
    Config, CrawlerConfig, ExtractorConfig, FetcherConfig, FieldSelector, FilesConfig,
    LocationConfig, StoreConfig,
};
use directory_harvest::crawler::{CrawlOrchestrator, RateLimitedFetcher, RunSummary, SelectorExtractor};
use directory_harvest::state::{CheckpointStore, RegionCheckpoint};
use directory_harvest::storage::{
    BufferedDedupWriter, DocumentStore, IndustryRecord, LocationRecord, PersistedCompanyRecord,
    SqliteDocumentStore, WriterConfig,
};
use directory_harvest::{FetchError, HarvestError};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEYWORDS: &str = r#"{"Tech": ["software", "app"], "Food": ["restaurant"]}"#;

/// A temporary workspace with checkpoint files, a keyword table and a store
struct Harness {
    dir: TempDir,
    config: Config,
    store: Arc<Mutex<SqliteDocumentStore>>,
}

impl Harness {
    /// Creates a workspace whose work list holds the given regions
    fn new(regions: &[(&str, String)]) -> Self {
        let dir = TempDir::new().unwrap();

        let work_list: Vec<RegionCheckpoint> = regions
            .iter()
            .map(|(name, url)| RegionCheckpoint::new(*name, url.as_str()))
            .collect();
        CheckpointStore::new(
            dir.path().join("regions.json"),
            dir.path().join("completed_regions.json"),
        )
        .write_regions(&work_list)
        .unwrap();
        std::fs::write(dir.path().join("keywords.json"), KEYWORDS).unwrap();
        std::fs::write(
            dir.path().join("region_states.json"),
            r#"{"Douala": "Littoral", "Buea": "South-West"}"#,
        )
        .unwrap();

        let config = Config {
            fetcher: FetcherConfig {
                base_delay_ms: 0,
                max_delay_ms: 0,
                timeout_secs: 5,
                user_agents: vec![],
            },
            crawler: CrawlerConfig {
                min_pause_ms: 0,
                max_pause_ms: 0,
            },
            store: StoreConfig {
                database_path: dir.path().join("harvest.db"),
                ..StoreConfig::default()
            },
            files: FilesConfig {
                regions: dir.path().join("regions.json"),
                completed_regions: dir.path().join("completed_regions.json"),
                keyword_table: dir.path().join("keywords.json"),
                region_states: Some(dir.path().join("region_states.json")),
            },
            location: LocationConfig {
                country: "Cameroon".to_string(),
            },
            extractor: ExtractorConfig {
                detail_link: "div.listing a.company".to_string(),
                next_page: Some("a.next".to_string()),
                name: FieldSelector::text("h1.name"),
                description: Some(FieldSelector::text("div.about")),
                tags: Some(FieldSelector::text("ul.tags li")),
                contact_numbers: Some(FieldSelector::text("span.phone")),
                ..ExtractorConfig::default()
            },
            discovery: None,
        };

        let store = Arc::new(Mutex::new(SqliteDocumentStore::open_in_memory().unwrap()));

        Self { dir, config, store }
    }

    async fn harvest(&self) -> Result<RunSummary, HarvestError> {
        let extractor = SelectorExtractor::from_config(&self.config.extractor).unwrap();
        let orchestrator =
            CrawlOrchestrator::from_config(&self.config, Arc::clone(&self.store), extractor)
                .unwrap();
        orchestrator.harvest().await
    }

    fn checkpoints(&self) -> CheckpointStore {
        CheckpointStore::new(
            &self.config.files.regions,
            &self.config.files.completed_regions,
        )
    }

    fn count(&self, collection: &str) -> u64 {
        self.store.lock().unwrap().count(collection).unwrap()
    }

    fn records<T: serde::de::DeserializeOwned>(&self, collection: &str) -> Vec<(String, T)> {
        self.store
            .lock()
            .unwrap()
            .documents(collection)
            .unwrap()
            .into_iter()
            .map(|doc| {
                let record = serde_json::from_value(doc.body.into()).unwrap();
                (doc.id.as_str().to_string(), record)
            })
            .collect()
    }
}

fn listing_page(detail_paths: &[&str], next_path: Option<&str>) -> String {
    let links: String = detail_paths
        .iter()
        .map(|p| format!(r#"<a class="company" href="{}">Company</a>"#, p))
        .collect();
    let next = next_path
        .map(|p| format!(r#"<a class="next" href="{}">Next</a>"#, p))
        .unwrap_or_default();

    format!(
        r#"<html><body><div class="listing">{}</div>{}</body></html>"#,
        links, next
    )
}

fn company_page(name: &str, tags: &[&str], description: &str) -> String {
    let tags: String = tags.iter().map(|t| format!("<li>{}</li>", t)).collect();
    format!(
        r#"<html><body>
            <h1 class="name">{}</h1>
            <ul class="tags">{}</ul>
            <div class="about">{}</div>
            <span class="phone">+237 600 000 000</span>
        </body></html>"#,
        name, tags, description
    )
}

async fn mount_html(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, page_path: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Region "Douala": two listing pages, three distinct companies
async fn mount_douala(server: &MockServer) {
    mount_html(
        server,
        "/location/douala",
        listing_page(
            &["/company/acme", "/company/mamas-kitchen"],
            Some("/location/douala/page/2"),
        ),
    )
    .await;
    mount_html(
        server,
        "/location/douala/page/2",
        listing_page(&["/company/initech"], None),
    )
    .await;
    mount_html(
        server,
        "/company/acme",
        company_page("Acme", &["We build software apps"], "Software house"),
    )
    .await;
    mount_html(
        server,
        "/company/mamas-kitchen",
        company_page("Mama's Kitchen", &[], "Family restaurant in Akwa"),
    )
    .await;
    mount_html(
        server,
        "/company/initech",
        company_page("Initech", &["printers"], "Office supplies"),
    )
    .await;
}

#[tokio::test]
async fn test_two_page_region_end_to_end() {
    let server = MockServer::start().await;
    mount_douala(&server).await;

    let entry_url = format!("{}/location/douala", server.uri());
    let harness = Harness::new(&[("Douala", entry_url.clone())]);

    let summary = harness.harvest().await.unwrap();

    assert_eq!(summary.regions_completed, 1);
    assert_eq!(summary.pages_walked, 2);
    assert_eq!(summary.details_fetched, 3);
    assert_eq!(summary.records_added, 3);

    assert_eq!(harness.count("companies"), 3);
    assert_eq!(harness.count("locations"), 3);

    let completed = harness.checkpoints().load_completed().unwrap();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed.entry_url("Douala"), Some(entry_url.as_str()));

    let locations: Vec<(String, LocationRecord)> = harness.records("locations");
    for (_, location) in &locations {
        assert_eq!(location.country, "Cameroon");
        assert_eq!(location.city, "Douala");
        assert_eq!(location.state.as_deref(), Some("Littoral"));
    }

    let industries: Vec<(String, IndustryRecord)> = harness.records("industries");
    let industry_names: Vec<&str> = industries.iter().map(|(_, i)| i.name.as_str()).collect();
    assert_eq!(industry_names, vec!["Tech", "Food", "unknown"]);

    let companies: Vec<(String, PersistedCompanyRecord)> = harness.records("companies");
    let industry_of = |company: &str| {
        let (_, record) = companies.iter().find(|(_, c)| c.name == company).unwrap();
        let (_, industry) = industries
            .iter()
            .find(|(id, _)| id == record.industry_id.as_str())
            .unwrap();
        industry.name.clone()
    };

    // Tags win over description; description is used when there are no tags
    assert_eq!(industry_of("Acme"), "Tech");
    assert_eq!(industry_of("Mama's Kitchen"), "Food");
    assert_eq!(industry_of("Initech"), "unknown");

    for (_, company) in &companies {
        assert_eq!(company.revenue, "");
        assert_eq!(company.contact_numbers, vec!["+237 600 000 000"]);
        assert!(locations
            .iter()
            .any(|(id, _)| id == company.location_id.as_str()));
    }
}

#[tokio::test]
async fn test_completed_region_is_not_fetched_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/location/douala"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[], None)))
        .expect(0)
        .mount(&server)
        .await;
    mount_html(&server, "/location/buea", listing_page(&[], None)).await;

    let douala = format!("{}/location/douala", server.uri());
    let buea = format!("{}/location/buea", server.uri());
    let harness = Harness::new(&[("Douala", douala.clone()), ("Buea", buea)]);
    std::fs::write(
        &harness.config.files.completed_regions,
        serde_json::to_string(&json!({ "Douala": douala })).unwrap(),
    )
    .unwrap();

    let summary = harness.harvest().await.unwrap();

    assert_eq!(summary.regions_skipped, 1);
    assert_eq!(summary.regions_completed, 1);
    assert_eq!(harness.checkpoints().load_completed().unwrap().len(), 2);
}

#[tokio::test]
async fn test_rewalking_a_region_does_not_duplicate_companies() {
    let server = MockServer::start().await;
    mount_douala(&server).await;

    let harness = Harness::new(&[("Douala", format!("{}/location/douala", server.uri()))]);

    harness.harvest().await.unwrap();
    std::fs::remove_file(&harness.config.files.completed_regions).unwrap();
    let second = harness.harvest().await.unwrap();

    assert_eq!(second.records_added, 0);
    assert_eq!(second.duplicates, 3);
    assert_eq!(harness.count("companies"), 3);
    assert_eq!(harness.count("industries"), 3);

    // One location per company visited, with no dedup
    assert_eq!(harness.count("locations"), 6);
}

#[tokio::test]
async fn test_duplicate_names_in_one_run_are_stored_once() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/location/buea",
        listing_page(&["/company/acme", "/company/acme-branch"], None),
    )
    .await;
    mount_html(&server, "/company/acme", company_page("Acme", &["software"], "")).await;
    mount_html(
        &server,
        "/company/acme-branch",
        company_page("Acme", &["software"], "Branch office"),
    )
    .await;

    let harness = Harness::new(&[("Buea", format!("{}/location/buea", server.uri()))]);
    let summary = harness.harvest().await.unwrap();

    assert_eq!(summary.records_added, 1);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(harness.count("companies"), 1);
}

#[tokio::test]
async fn test_failed_detail_page_is_skipped() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/location/douala",
        listing_page(&["/company/acme", "/company/broken", "/company/initech"], None),
    )
    .await;
    mount_html(&server, "/company/acme", company_page("Acme", &["software"], "")).await;
    mount_status(&server, "/company/broken", 500).await;
    mount_html(&server, "/company/initech", company_page("Initech", &[], "")).await;

    let harness = Harness::new(&[("Douala", format!("{}/location/douala", server.uri()))]);
    let summary = harness.harvest().await.unwrap();

    assert_eq!(summary.details_failed, 1);
    assert_eq!(summary.records_added, 2);
    assert_eq!(harness.count("companies"), 2);
    assert!(harness
        .checkpoints()
        .load_completed()
        .unwrap()
        .contains("Douala"));
}

#[tokio::test]
async fn test_placeholder_detail_page_is_skipped() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/location/douala",
        listing_page(&["/company/acme", "/company/removed"], None),
    )
    .await;
    mount_html(&server, "/company/acme", company_page("Acme", &["software"], "")).await;
    mount_html(
        &server,
        "/company/removed",
        "<html><body><p>This listing is no longer available</p></body></html>".to_string(),
    )
    .await;

    let harness = Harness::new(&[("Douala", format!("{}/location/douala", server.uri()))]);
    let summary = harness.harvest().await.unwrap();

    assert_eq!(summary.details_empty, 1);
    assert_eq!(harness.count("companies"), 1);
    assert_eq!(harness.count("locations"), 1);
}

#[tokio::test]
async fn test_listing_failure_aborts_and_flushes_buffered_records() {
    let server = MockServer::start().await;
    mount_douala(&server).await;

    // Limbe: first page fine, second page unreachable
    mount_html(
        &server,
        "/location/limbe",
        listing_page(&["/company/limbe-fish"], Some("/location/limbe/page/2")),
    )
    .await;
    mount_html(
        &server,
        "/company/limbe-fish",
        company_page("Limbe Fish Market", &[], "Seafood restaurant"),
    )
    .await;
    mount_status(&server, "/location/limbe/page/2", 503).await;

    Mock::given(method("GET"))
        .and(path("/location/buea"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[], None)))
        .expect(0)
        .mount(&server)
        .await;

    let harness = Harness::new(&[
        ("Douala", format!("{}/location/douala", server.uri())),
        ("Limbe", format!("{}/location/limbe", server.uri())),
        ("Buea", format!("{}/location/buea", server.uri())),
    ]);

    let order: Vec<String> = harness
        .checkpoints()
        .load_regions()
        .unwrap()
        .into_iter()
        .map(|r| r.region_name)
        .collect();
    assert_eq!(order, vec!["Douala", "Limbe", "Buea"]);

    let err = harness.harvest().await.unwrap_err();
    assert!(matches!(
        err,
        HarvestError::Fetch(FetchError::Status { status: 503, .. })
    ));

    let completed = harness.checkpoints().load_completed().unwrap();
    assert!(completed.contains("Douala"));
    assert!(!completed.contains("Limbe"));
    assert!(!completed.contains("Buea"));

    // Nothing reached the buffer size; these were written by the close on the error path
    assert_eq!(harness.count("companies"), 4);
}

#[tokio::test]
async fn test_company_flush_on_buffer_size() {
    let server = MockServer::start().await;
    mount_douala(&server).await;

    let mut harness = Harness::new(&[("Douala", format!("{}/location/douala", server.uri()))]);
    harness.config.store.buffer_size = 2;

    let store = Arc::clone(&harness.store);
    let extractor = SelectorExtractor::from_config(&harness.config.extractor).unwrap();
    let mut orchestrator =
        CrawlOrchestrator::from_config(&harness.config, store, extractor).unwrap();

    orchestrator.run().await.unwrap();
    assert_eq!(harness.count("companies"), 2);

    orchestrator.close();
    assert_eq!(harness.count("companies"), 3);
}

#[tokio::test]
async fn test_inverted_pause_bounds_still_walk_the_region() {
    let server = MockServer::start().await;
    mount_douala(&server).await;

    let mut harness = Harness::new(&[("Douala", format!("{}/location/douala", server.uri()))]);
    harness.config.crawler.min_pause_ms = 5;
    harness.config.crawler.max_pause_ms = 0;

    let summary = harness.harvest().await.unwrap();

    assert_eq!(summary.regions_completed, 1);
    assert_eq!(harness.count("companies"), 3);
}

#[tokio::test]
async fn test_writer_flush_on_max_wait() {
    let store = Arc::new(Mutex::new(SqliteDocumentStore::open_in_memory().unwrap()));
    let mut writer = BufferedDedupWriter::open(
        Arc::clone(&store),
        WriterConfig::new("companies")
            .with_buffer_size(100)
            .with_max_wait(Duration::from_millis(50)),
    )
    .unwrap();

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(writer.add(&json!({ "name": "Acme" })).unwrap());

    assert_eq!(writer.pending(), 0);
    assert_eq!(store.lock().unwrap().count("companies").unwrap(), 1);
    writer.close();
}

#[tokio::test]
async fn test_find_or_create_returns_same_id() {
    let store = Arc::new(Mutex::new(SqliteDocumentStore::open_in_memory().unwrap()));
    let mut industries =
        BufferedDedupWriter::open(Arc::clone(&store), WriterConfig::new("industries")).unwrap();

    let first = industries.find_or_create("Tech").unwrap();
    let second = industries.find_or_create("Tech").unwrap();

    assert_eq!(first, second);
    assert_eq!(store.lock().unwrap().count("industries").unwrap(), 1);
    industries.close();
}

#[tokio::test]
async fn test_same_domain_requests_are_spaced_by_base_delay() {
    let server = MockServer::start().await;
    mount_html(&server, "/page", "ok".to_string()).await;

    let mut fetcher = RateLimitedFetcher::new(&FetcherConfig {
        base_delay_ms: 3000,
        max_delay_ms: 3000,
        timeout_secs: 5,
        user_agents: vec![],
    })
    .unwrap();

    let url = format!("{}/page", server.uri());
    let start = Instant::now();
    fetcher.fetch(&url).await.unwrap();
    fetcher.fetch(&url).await.unwrap();

    assert!(start.elapsed() >= Duration::from_secs(3));
}

#[tokio::test]
async fn test_different_domains_are_not_serialized() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    mount_html(&first, "/page", "one".to_string()).await;
    mount_html(&second, "/page", "two".to_string()).await;

    let mut fetcher = RateLimitedFetcher::new(&FetcherConfig {
        base_delay_ms: 3000,
        max_delay_ms: 3000,
        timeout_secs: 5,
        user_agents: vec![],
    })
    .unwrap();

    let start = Instant::now();
    fetcher.fetch(&format!("{}/page", first.uri())).await.unwrap();
    fetcher.fetch(&format!("{}/page", second.uri())).await.unwrap();

    assert!(start.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_region_discovery_feeds_the_harvest() {
    let server = MockServer::start().await;
    mount_douala(&server).await;
    mount_html(
        &server,
        "/cities",
        r#"<ul class="cities"><li><a href="/location/douala">Douala</a></li></ul>"#.to_string(),
    )
    .await;

    let harness = Harness::new(&[]);
    let mut fetcher = RateLimitedFetcher::new(&harness.config.fetcher).unwrap();
    let discovery = directory_harvest::config::DiscoveryConfig {
        directory_url: format!("{}/cities", server.uri()),
        region_link: "ul.cities a".to_string(),
    };

    let regions =
        directory_harvest::crawler::discover_regions(&mut fetcher, &discovery, &harness.checkpoints())
            .await
            .unwrap();
    assert_eq!(regions.len(), 1);

    let summary = harness.harvest().await.unwrap();
    assert_eq!(summary.regions_completed, 1);
    assert_eq!(harness.count("companies"), 3);
    assert!(harness.dir.path().join("regions.json").exists());
}
