//! Listing Harvester: a bounded, deduplicating classifieds crawler
//!
//! This crate walks the paginated listing pages of one category on a
//! classifieds site, deduplicates listings by their canonical URL, optionally
//! enriches each listing from its own detail page, and streams the accepted
//! records into a CSV file as they are collected.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to fetch listing page {url}: {source}")]
    PageFetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("Failed to extract listings from {url}: {source}")]
    PageExtract {
        url: String,
        #[source]
        source: ExtractError,
    },

    #[error("Extractor setup failed: {0}")]
    Extractor(#[from] ExtractError),

    #[error("Category discovery failed: {0}")]
    Discovery(#[source] FetchError),

    #[error("Category cache error: {0}")]
    CategoryCache(#[from] serde_json::Error),

    #[error("No category matches '{0}'")]
    CategoryNotFound(String),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Output writer stopped before the run finished")]
    SinkClosed,

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Writer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Empty reference")]
    Empty,
}

/// Failures while retrieving a document over HTTP
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Failures while pulling fields out of a fetched document
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid selector '{0}'")]
    Selector(String),

    #[error("page markup not recognised: {0}")]
    Malformed(String),
}

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use catalog::{load_categories, select_category, Category};
pub use config::Config;
pub use crawler::{run_harvest, Coordinator, HarvestRequest, ListingRecord};
pub use output::{HarvestOutcome, HarvestSummary};
pub use state::{RunPhase, RunState};
pub use self::url::{absolutize, page_url};
