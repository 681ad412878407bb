//! Crawler module for listing collection
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching over one shared client
//! - Field extraction from listing, detail and home pages
//! - Run-scoped deduplication of listings by URL
//! - Detail-page enrichment
//! - Progress events for front ends
//! - The page loop tying them together

mod coordinator;
mod enrich;
mod events;
mod extract;
mod fetcher;
mod ledger;
mod record;

pub use coordinator::{run_harvest, Coordinator, HarvestRequest};
pub use enrich::{enrich, EnrichError};
pub use events::HarvestEvent;
pub use extract::Extractor;
pub use fetcher::{build_http_client, Fetcher};
pub use ledger::DedupLedger;
pub use record::{ListingDetails, ListingRecord};
