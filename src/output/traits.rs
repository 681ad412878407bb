//! Output traits and types
//!
//! This module defines the sink interface records are written through and
//! the summary handed back to the caller when a run ends.

use crate::crawler::ListingRecord;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Append-only destination for accepted records
///
/// Rows arrive in acceptance order. Each `append` must be visible in the
/// underlying file before it returns, so a process killed mid-run leaves a
/// readable prefix of the output.
pub trait RecordSink {
    /// Writes one record as one row
    fn append(&mut self, record: &ListingRecord) -> OutputResult<()>;

    /// Number of data rows written so far
    fn rows_written(&self) -> usize;

    /// Flushes and releases the destination
    fn close(self) -> OutputResult<usize>
    where
        Self: Sized;
}

/// How a run that did not abort came to an end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestOutcome {
    /// The requested number of listings was collected
    TargetReached,
    /// The category ran out of listings first
    Exhausted,
}

impl fmt::Display for HarvestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetReached => write!(f, "target reached"),
            Self::Exhausted => write!(f, "category exhausted"),
        }
    }
}

/// Summary of a finished harvest run
#[derive(Debug, Clone)]
pub struct HarvestSummary {
    pub category: String,
    pub requested: usize,
    pub collected: usize,
    pub pages_fetched: u32,
    pub duplicates_skipped: usize,

    /// Pages on which every listing had already been seen
    pub stale_pages: u32,

    /// Listings whose detail page failed
    pub enrichment_failures: usize,

    /// Failed listings that were still written with base fields only
    pub enrichment_fallbacks: usize,

    pub outcome: HarvestOutcome,
    pub output_path: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl HarvestSummary {
    /// Returns true when fewer listings were written than requested
    pub fn is_short(&self) -> bool {
        self.collected < self.requested
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}

impl fmt::Display for HarvestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "collected {} of {} listings ({})",
            self.collected, self.requested, self.outcome
        )
    }
}
