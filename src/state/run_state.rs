use crate::state::RunPhase;

/// Progress of one harvest run
///
/// Owned by the coordinator and mutated only by it; dropped when the run
/// terminates.
#[derive(Debug, Clone)]
pub struct RunState {
    /// Display title of the category being harvested
    pub category: String,

    /// Number of listings requested
    pub target: usize,

    /// Number of listings handed to the output so far
    pub accepted: usize,

    /// Index of the page currently being processed (1-based, 0 before the first fetch)
    pub page: u32,

    phase: RunPhase,
}

impl RunState {
    /// Creates an idle run state
    pub fn new(category: impl Into<String>, target: usize) -> Self {
        Self {
            category: category.into(),
            target,
            accepted: 0,
            page: 0,
            phase: RunPhase::Idle,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Moves the run to another phase
    ///
    /// Illegal steps are logged and ignored so a bookkeeping slip never
    /// brings down a run that is otherwise healthy.
    pub fn transition(&mut self, next: RunPhase) {
        if self.phase == next {
            return;
        }

        if self.phase.can_transition_to(next) {
            tracing::trace!("Run phase {} -> {}", self.phase, next);
            self.phase = next;
        } else {
            tracing::warn!("Ignoring invalid run phase transition {} -> {}", self.phase, next);
        }
    }

    /// Advances to the next page and returns its index
    pub fn next_page(&mut self) -> u32 {
        self.page += 1;
        self.page
    }

    /// Records one listing handed to the output
    pub fn record_accepted(&mut self) {
        self.accepted += 1;
    }

    /// Number of listings still needed to reach the target
    pub fn remaining(&self) -> usize {
        self.target.saturating_sub(self.accepted)
    }

    pub fn is_target_reached(&self) -> bool {
        self.accepted >= self.target
    }
}
