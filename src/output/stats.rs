//! Run report printing

use crate::output::traits::HarvestSummary;

/// Prints a finished run's summary to stdout
pub fn print_summary(summary: &HarvestSummary) {
    println!("=== Harvest Summary ===\n");

    println!("Category: {}", summary.category);
    println!("Output: {}", summary.output_path.display());
    println!(
        "Started: {}  Finished: {}  ({}s)",
        summary.started_at.format("%Y-%m-%d %H:%M:%S"),
        summary.finished_at.format("%Y-%m-%d %H:%M:%S"),
        summary.duration_seconds()
    );
    println!();

    println!("Pages fetched: {}", summary.pages_fetched);
    println!("Duplicates skipped: {}", summary.duplicates_skipped);
    if summary.stale_pages > 0 {
        println!("Pages with no new listings: {}", summary.stale_pages);
    }
    if summary.enrichment_failures > 0 {
        println!(
            "Detail pages failed: {} ({} kept with base fields)",
            summary.enrichment_failures, summary.enrichment_fallbacks
        );
    }
    println!();

    if summary.is_short() {
        println!(
            "Collected {} of {} listings: the category ran out first",
            summary.collected, summary.requested
        );
    } else {
        println!("Collected {} of {} listings", summary.collected, summary.requested);
    }
}
