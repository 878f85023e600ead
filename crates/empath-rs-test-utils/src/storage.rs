use empath_rs_history::{HistoryError, HistoryStorage, HistoryStore};
use parking_lot::Mutex;
use std::sync::Arc;

/// History storage kept in memory; counts saves and keeps the last document.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    initial: HistoryStore,
    pub saved: Arc<Mutex<Vec<HistoryStore>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial(initial: HistoryStore) -> Self {
        Self {
            initial,
            saved: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saved.lock().len()
    }

    pub fn last_saved(&self) -> Option<HistoryStore> {
        self.saved.lock().last().cloned()
    }
}

impl HistoryStorage for MemoryStorage {
    fn load(&self) -> HistoryStore {
        self.saved
            .lock()
            .last()
            .cloned()
            .unwrap_or_else(|| self.initial.clone())
    }

    fn save(&self, store: &HistoryStore) -> Result<(), HistoryError> {
        self.saved.lock().push(store.clone());
        Ok(())
    }
}
