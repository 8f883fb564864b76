use std::collections::VecDeque;
use std::time::SystemTime;

use serde::Serialize;

/// Maximum number of retained failover events. Oldest entries are evicted
/// on overflow.
pub const HISTORY_CAPACITY: usize = 10;

/// A recorded switch of the active node.
#[derive(Debug, Clone, Serialize)]
pub struct FailoverEvent {
    pub timestamp: SystemTime,
    /// Name of the node that was switched away from.
    pub from: String,
    /// Name of the node that became current.
    pub to: String,
    /// Why the switch happened, e.g. "3 consecutive failures".
    pub reason: String,
}

/// Newest-first record of recent failovers, bounded at [`HISTORY_CAPACITY`].
#[derive(Debug, Default)]
pub struct FailoverHistory {
    entries: VecDeque<FailoverEvent>,
}

impl FailoverHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event as the newest entry, evicting the oldest when full.
    pub fn record(&mut self, event: FailoverEvent) {
        self.entries.push_front(event);
        if self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_back();
        }
    }

    /// Events, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &FailoverEvent> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&FailoverEvent> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
