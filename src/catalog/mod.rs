//! Category catalog
//!
//! Categories are discovered once from the site's home page and cached as a
//! JSON file. Later runs read the cache and never touch the network.

mod cache;

pub use cache::{load_categories, read_cache, write_cache};

use crate::url::absolutize;
use crate::{HarvestError, Result, UrlResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One top-level category of the site
///
/// The identifier is whatever the site uses to tag its menu entries and is
/// only used as a selection key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "category_id", default)]
    pub id: String,

    pub title: String,

    /// Absolute or site-relative link to the category's first listing page
    pub href: String,

    #[serde(rename = "image_src", default)]
    pub image: String,
}

impl Category {
    /// Absolute URL of the category's first listing page
    pub fn base_url(&self, origin: &str) -> UrlResult<String> {
        absolutize(origin, &self.href)
    }

    /// File name for this category's output: its title with `/` made safe
    pub fn output_file_name(&self) -> String {
        format!("{}.csv", self.title.trim().replace('/', "_"))
    }

    /// Output path inside `directory`
    pub fn output_path(&self, directory: impl AsRef<Path>) -> PathBuf {
        directory.as_ref().join(self.output_file_name())
    }
}

/// Picks a category by 1-based position, identifier, or exact title
///
/// Position wins when the selector is numeric and in range; identifiers and
/// titles are compared case-insensitively.
pub fn select_category<'a>(categories: &'a [Category], selector: &str) -> Result<&'a Category> {
    let selector = selector.trim();

    if let Ok(position) = selector.parse::<usize>() {
        if let Some(category) = position.checked_sub(1).and_then(|i| categories.get(i)) {
            return Ok(category);
        }
    }

    categories
        .iter()
        .find(|c| c.id.eq_ignore_ascii_case(selector))
        .or_else(|| {
            let wanted = selector.to_lowercase();
            categories.iter().find(|c| c.title.to_lowercase() == wanted)
        })
        .ok_or_else(|| HarvestError::CategoryNotFound(selector.to_string()))
}

/// Prints the numbered category table used for selection
pub fn print_categories(categories: &[Category]) {
    println!("=== Categories ===\n");
    for (index, category) in categories.iter().enumerate() {
        println!("{:>4}. {}", index + 1, category.title);
    }
    println!();
}
