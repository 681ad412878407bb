//! Progress events emitted during a harvest run
//!
//! The coordinator reports what it is doing over an optional channel so a
//! front end can render progress without the library knowing how.

/// Progress notifications sent by the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEvent {
    /// The run started
    Started { category: String, target: usize },
    /// A listing page was fetched and parsed
    PageFetched { page: u32, candidates: usize },
    /// A listing was handed to the output writer
    ListingAccepted { accepted: usize },
    /// A listing's detail page could not be fetched
    EnrichmentFailed { url: String, error: String },
    /// A page carried no listing that had not been seen before
    StalePage { page: u32 },
    /// The run stopped without aborting
    Finished { collected: usize },
}
