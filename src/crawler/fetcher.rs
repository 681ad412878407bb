//! HTTP fetcher implementation
//!
//! One `reqwest::Client` is built per run and shared by every page, detail
//! and discovery request. Nothing here retries: a failed request is reported
//! to the caller, which decides whether it is fatal.

use crate::config::{HarvestConfig, SiteConfig};
use crate::FetchError;
use reqwest::Client;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `site` - Site settings carrying the User-Agent header
/// * `harvest` - Crawl settings carrying the request timeout
///
/// # Example
///
/// ```no_run
/// use listing_harvester::config::Config;
/// use listing_harvester::crawler::build_http_client;
///
/// let config = Config::default();
/// let client = build_http_client(&config.site, &config.harvest).unwrap();
/// ```
pub fn build_http_client(
    site: &SiteConfig,
    harvest: &HarvestConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(site.user_agent.clone())
        .timeout(Duration::from_secs(harvest.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrieves documents over a shared client
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher from configuration
    pub fn from_config(site: &SiteConfig, harvest: &HarvestConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(site, harvest)?))
    }

    /// Fetches a URL and returns its body as text
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx | `Ok(body)` |
    /// | any other status | `FetchError::Status` |
    /// | connect/timeout/body error | `FetchError::Transport` |
    pub async fn fetch_document(&self, url: &str) -> Result<String, FetchError> {
        tracing::trace!("GET {}", url);

        let response = self
            .client
            .get(url)
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

        response.text().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })
    }
}
