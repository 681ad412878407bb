//! Output module
//!
//! This module handles:
//! - Streaming accepted listings into a CSV file, one flushed row at a time
//! - Summarising a finished run for the caller

mod csv_output;
pub mod stats;
mod traits;

pub use csv_output::{CsvSink, Schema, BASE_COLUMNS, EXTENDED_COLUMNS};
pub use stats::print_summary;
pub use traits::{HarvestOutcome, HarvestSummary, OutputError, OutputResult, RecordSink};
