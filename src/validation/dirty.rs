//! Order-independent change detection for editable row collections.

use std::collections::HashSet;
use std::hash::Hash;

/// Projects a row onto the fields that matter when deciding whether it changed.
/// Server-assigned identifiers stay out of the key.
pub trait Canonical {
    type Key: Ord + Clone;

    fn canonical(&self) -> Self::Key;
}

fn canonical_sorted<R: Canonical>(rows: &[R]) -> Vec<R::Key> {
    let mut keys: Vec<R::Key> = rows.iter().map(Canonical::canonical).collect();
    keys.sort();
    keys
}

pub fn is_dirty<R: Canonical>(current: &[R], baseline: &[R]) -> bool {
    canonical_sorted(current) != canonical_sorted(baseline)
}

/// Remembers the last collection known to match the server.
#[derive(Debug, Clone)]
pub struct DirtyTracker<R: Canonical> {
    baseline: Vec<R::Key>,
}

impl<R: Canonical> DirtyTracker<R> {
    pub fn new(baseline: &[R]) -> Self {
        Self {
            baseline: canonical_sorted(baseline),
        }
    }

    /// Adopt `rows` as the new snapshot, after a save or a refetch.
    pub fn rebase(&mut self, rows: &[R]) {
        self.baseline = canonical_sorted(rows);
    }

    pub fn is_dirty(&self, current: &[R]) -> bool {
        canonical_sorted(current) != self.baseline
    }
}

/// First key seen twice, scanning in order. Rows without a key are skipped.
pub fn first_duplicate<T, K, F>(rows: &[T], key: F) -> Option<K>
where
    K: Eq + Hash + Clone,
    F: Fn(&T) -> Option<K>,
{
    let mut seen = HashSet::new();
    for row in rows {
        if let Some(k) = key(row) {
            if !seen.insert(k.clone()) {
                return Some(k);
            }
        }
    }
    None
}

/// Conditions that together enable a table's save button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveGate {
    pub all_valid: bool,
    pub dirty: bool,
    pub duplicate_free: bool,
}

impl SaveGate {
    pub fn can_save(&self) -> bool {
        self.all_valid && self.dirty && self.duplicate_free
    }

    /// Short reason shown next to a disabled save button.
    pub fn blocked_reason(&self) -> Option<&'static str> {
        if !self.all_valid {
            Some("fix the highlighted rows")
        } else if !self.duplicate_free {
            Some("the same person is listed twice")
        } else if !self.dirty {
            Some("no unsaved changes")
        } else {
            None
        }
    }
}
