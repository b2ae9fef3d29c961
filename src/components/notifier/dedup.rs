use crate::components::calendar::OccurrenceId;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

/// In-memory record of which (recipient, occurrence) reminders have
/// already been sent.
///
/// Deliberately unpersisted: a restart forgets all suppressions, and an
/// occurrence still inside the lead window is re-notified once. The
/// store is owned by the scheduler loop and needs no locking.
#[derive(Debug, Default)]
pub struct NotifiedStore {
    notified: HashMap<i64, HashSet<OccurrenceId>>,
}

impl NotifiedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Has this recipient already been notified of this occurrence?
    pub fn has(&self, recipient: i64, id: &OccurrenceId) -> bool {
        self.notified
            .get(&recipient)
            .is_some_and(|ids| ids.contains(id))
    }

    /// Record a delivered reminder
    pub fn mark(&mut self, recipient: i64, id: OccurrenceId) {
        self.notified.entry(recipient).or_default().insert(id);
    }

    /// Drop entries whose occurrence date is before the cutoff.
    ///
    /// Entries with an unreadable start date cannot age out, so they
    /// are dropped too.
    pub fn prune(&mut self, cutoff: NaiveDate) {
        for ids in self.notified.values_mut() {
            ids.retain(|id| id.start_date().is_some_and(|date| date >= cutoff));
        }
        self.notified.retain(|_, ids| !ids.is_empty());
    }

    /// Forget everything. Used as a fail-safe when the calendar source
    /// is missing or unreachable, so stale suppressions do not survive
    /// a source change.
    pub fn clear(&mut self) {
        self.notified.clear();
    }

    /// Total number of recorded (recipient, occurrence) pairs
    pub fn len(&self) -> usize {
        self.notified.values().map(HashSet::len).sum()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
