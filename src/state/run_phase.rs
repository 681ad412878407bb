/// Phase definitions for one harvest run
///
/// A run moves through these phases as the controller pages through a
/// category, extracts candidates and optionally enriches them.
use std::fmt;

/// Represents the current phase of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    // ===== Active Phases =====
    /// Run created, nothing fetched yet (a zero target goes straight to `Done`)
    Idle,

    /// Fetching the next listing page
    Paging,

    /// Extracting, deduplicating and emitting the candidates of one page
    Extracting,

    /// Waiting for the detail pages of a batch of new listings
    Enriching,

    // ===== Terminal Phases =====
    /// Target reached or category exhausted
    Done,

    /// A listing page could not be fetched or understood
    Aborted,
}

impl RunPhase {
    /// Returns true if the run has finished, successfully or not
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Returns true if the run is still making progress
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if moving from `self` to `next` is a legal step
    ///
    /// Any active phase may abort; terminal phases never move again.
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        use RunPhase::*;

        match (self, next) {
            (from, Aborted) => from.is_active(),
            (Idle, Paging | Done) => true,
            (Paging, Extracting) => true,
            (Extracting, Enriching | Paging | Done) => true,
            (Enriching, Extracting | Done) => true,
            _ => false,
        }
    }

    /// Short lowercase name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Paging => "paging",
            Self::Extracting => "extracting",
            Self::Enriching => "enriching",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
