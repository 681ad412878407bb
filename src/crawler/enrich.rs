//! Detail-page enrichment of accepted listings

use crate::crawler::{Extractor, Fetcher, ListingRecord};
use crate::FetchError;
use thiserror::Error;

/// Why a single listing could not be enriched
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Fetches a listing's detail page and merges its fields into the record
///
/// The record is only modified when the fetch succeeds; on failure it is
/// left exactly as it was. A page that loads but carries none of the known
/// sections still enriches the record, with every extended field empty.
pub async fn enrich(
    fetcher: &Fetcher,
    extractor: &Extractor,
    record: &mut ListingRecord,
) -> Result<(), EnrichError> {
    let html = fetcher.fetch_document(&record.url).await?;

    record.enrich(extractor.extract_listing_details(&html));
    Ok(())
}
