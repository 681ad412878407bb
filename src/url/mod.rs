//! URL handling for the harvester
//!
//! Two pure helpers live here: resolving references found in site markup to
//! absolute URLs (which double as listing identity keys), and building the
//! URL of page N of a category listing.

mod normalize;
mod pagination;

pub use normalize::absolutize;
pub use pagination::page_url;
