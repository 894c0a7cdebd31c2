use std::time::Instant;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Submit,
    MarkFixed,
    AddException,
}

pub struct InFlight {
    /// (action, key) -> started
    entries: DashMap<(Action, String), Instant>,
}

impl InFlight {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn try_begin(&self, action: Action, key: impl Into<String>) -> Option<BusyGuard<'_>> {
        let key = (action, key.into());
        match self.entries.entry(key.clone()) {
            Entry::Occupied(entry) => {
                tracing::debug!(
                    "{:?} for {} already running for {:?}",
                    action,
                    key.1,
                    entry.get().elapsed()
                );
                None
            }
            Entry::Vacant(entry) => {
                entry.insert(Instant::now());
                Some(BusyGuard { owner: self, key })
            }
        }
    }

    pub fn is_busy(&self, action: Action, key: &str) -> bool {
        self.entries.contains_key(&(action, key.to_string()))
    }
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}

pub struct BusyGuard<'a> {
    owner: &'a InFlight,
    key: (Action, String),
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.owner.entries.remove(&self.key);
    }
}

pub fn record_key(result_id: &str, record_id: &str) -> String {
    format!("{result_id}:{record_id}")
}
