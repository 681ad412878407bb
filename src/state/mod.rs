//! Run state tracking
//!
//! - `RunPhase`: where a harvest run is in its page/extract/enrich cycle
//! - `RunState`: target, progress and current page of one run

mod run_phase;
mod run_state;

pub use run_phase::RunPhase;
pub use run_state::RunState;
