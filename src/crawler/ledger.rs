//! Run-scoped record of identity keys already accepted

use std::collections::HashSet;

/// Set of listing URLs seen during one run
///
/// Append-only, never persisted, dropped with the run. Owned by the
/// coordinator alone, so no locking is involved.
#[derive(Debug, Default)]
pub struct DedupLedger {
    seen: HashSet<String>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `key` and returns true on its first occurrence, false on repeats
    pub fn accept(&mut self, key: &str) -> bool {
        if self.seen.contains(key) {
            return false;
        }
        self.seen.insert(key.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
