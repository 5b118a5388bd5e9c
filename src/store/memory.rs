use super::{RankingStore, StoreError};
use crate::models::leaderboard::Entry;
use std::sync::{Mutex, PoisonError};

/// Process-local store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    #[cfg(test)]
    pub fn with_entries(entries: Vec<Entry>) -> Self {
        MemoryStore {
            entries: Mutex::new(entries),
        }
    }
}

impl RankingStore for MemoryStore {
    fn load(&self) -> Result<Vec<Entry>, StoreError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, entries: &[Entry]) -> Result<(), StoreError> {
        *self.entries.lock().unwrap_or_else(PoisonError::into_inner) = entries.to_vec();
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
