use crate::catalog::Category;
use crate::config::SiteConfig;
use crate::crawler::{Extractor, Fetcher};
use crate::{HarvestError, Result};
use std::path::Path;

/// Loads the category list, discovering it only when no cache exists
///
/// # Behavior
///
/// - Cache file present: parsed and returned; no request is made
/// - Cache file absent: the home page is fetched, its category menu is
///   extracted, the result is written to the cache and returned
///
/// # Arguments
///
/// * `cache_path` - Location of the JSON cache
/// * `fetcher` - Shared HTTP fetcher, used only on a cache miss
/// * `site` - Site settings (origin and discovery URL)
pub async fn load_categories(
    cache_path: &Path,
    fetcher: &Fetcher,
    site: &SiteConfig,
) -> Result<Vec<Category>> {
    if cache_path.exists() {
        tracing::debug!("Reading categories from {}", cache_path.display());
        return read_cache(cache_path);
    }

    tracing::info!(
        "No category cache at {}, discovering from {}",
        cache_path.display(),
        site.categories_url
    );

    let html = fetcher
        .fetch_document(&site.categories_url)
        .await
        .map_err(HarvestError::Discovery)?;

    let extractor = Extractor::new(site.origin.clone())?;
    let categories = extractor.extract_categories(&html);

    write_cache(cache_path, &categories)?;
    tracing::info!("Cached {} categories", categories.len());

    Ok(categories)
}

/// Reads a category cache file
pub fn read_cache(path: &Path) -> Result<Vec<Category>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Writes a category cache file, creating parent directories as needed
pub fn write_cache(path: &Path, categories: &[Category]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(categories)?;
    std::fs::write(path, content)?;
    Ok(())
}
