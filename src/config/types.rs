use serde::Deserialize;

const DEFAULT_ORIGIN: &str = "https://www.olx.ua";
const DEFAULT_CATEGORIES_URL: &str = "https://www.olx.ua/uk/";
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.6422.112 Safari/537.36";

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// The classifieds site being harvested
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Fixed origin prefixed to every site-relative reference
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Page carrying the category menu, fetched once to build the category cache
    #[serde(default = "default_categories_url")]
    pub categories_url: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            categories_url: default_categories_url(),
            user_agent: default_user_agent(),
        }
    }
}

/// What to do with a listing whose detail page could not be fetched or parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnrichmentFailurePolicy {
    /// Discard the listing entirely
    #[default]
    Drop,
    /// Emit the listing with its base fields and empty extended columns
    KeepBase,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HarvestConfig {
    /// Number of listings collected when the caller does not ask for a count
    #[serde(default = "default_count")]
    pub default_count: usize,

    /// Maximum number of detail pages fetched at once while enriching one page
    #[serde(default = "default_enrichment_concurrency")]
    pub enrichment_concurrency: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub on_enrichment_failure: EnrichmentFailurePolicy,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            default_count: default_count(),
            enrichment_concurrency: default_enrichment_concurrency(),
            request_timeout_secs: default_request_timeout_secs(),
            on_enrichment_failure: EnrichmentFailurePolicy::default(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory receiving one CSV file per run
    #[serde(default = "default_output_directory")]
    pub directory: String,

    /// Path of the JSON category cache
    #[serde(default = "default_category_cache")]
    pub category_cache: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            category_cache: default_category_cache(),
        }
    }
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}

fn default_categories_url() -> String {
    DEFAULT_CATEGORIES_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_count() -> usize {
    50
}

fn default_enrichment_concurrency() -> usize {
    8
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_output_directory() -> String {
    "output".to_string()
}

fn default_category_cache() -> String {
    "olx_categories.json".to_string()
}
