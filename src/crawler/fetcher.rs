//! Rate-limited HTTP fetcher
//!
//! This module handles all HTTP requests for the harvester:
//! - Building the HTTP client with browser-like default headers
//! - Pacing requests per domain (see `DomainPacer`)
//! - Rotating the `User-Agent` on every request
//! - Mapping non-2xx statuses and transport failures to `FetchError`
//!
//! Failed fetches are never retried here.

use crate::config::FetcherConfig;
use crate::crawler::identity::IdentityPool;
use crate::crawler::pacer::DomainPacer;
use crate::url::domain_key;
use crate::FetchError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use std::time::{Duration, Instant};
use url::Url;

const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects; relative links resolve against it
    pub url: Url,

    /// HTTP status code (always 2xx)
    pub status: u16,

    /// Page body
    pub body: String,
}

/// Builds an HTTP client with the harvester's default headers
///
/// # Arguments
///
/// * `timeout` - Per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE));

    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages while spacing out requests to the same domain
pub struct RateLimitedFetcher {
    client: Client,
    pacer: DomainPacer,
    identities: IdentityPool,
}

impl RateLimitedFetcher {
    /// Creates a fetcher from configuration
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let client = build_http_client(config.timeout())?;
        let identities = IdentityPool::new(&config.user_agents);
        tracing::debug!("Fetcher rotating {} identities", identities.agents().len());

        Ok(Self {
            client,
            pacer: DomainPacer::new(config.base_delay(), config.max_delay()),
            identities,
        })
    }

    /// Fetches a page, waiting first if its domain was requested too recently
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute http(s) URL to fetch
    ///
    /// # Returns
    ///
    /// * `Ok(FetchedPage)` - 2xx response with its body
    /// * `Err(FetchError)` - Invalid URL, non-2xx status, or transport failure
    pub async fn fetch(&mut self, url: &str) -> Result<FetchedPage, FetchError> {
        let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;
        let domain = domain_key(&parsed).ok_or_else(|| FetchError::MissingHost(url.to_string()))?;

        let wait = self.pacer.delay_for(&domain, Instant::now());
        if !wait.is_zero() {
            tracing::debug!(domain = %domain, "Sleeping {:?} before request", wait);
            tokio::time::sleep(wait).await;
        }

        self.pacer.record_request(&domain, Instant::now());
        let user_agent = self.identities.pick().to_string();

        tracing::debug!(url = %parsed, domain = %domain, "Fetching");

        let response = self
            .client
            .get(parsed)
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }

    /// Number of requests sent to the domain of `url` in this run
    pub fn request_count(&self, url: &Url) -> u32 {
        domain_key(url).map_or(0, |d| self.pacer.request_count(&d))
    }
}
