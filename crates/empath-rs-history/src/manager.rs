//! In-memory history mirror with explicit flushes to durable storage.

use crate::error::HistoryError;
use crate::model::{ConversationEntry, ConversationLog, HistoryStore};
use crate::policy::RetentionPolicy;
use crate::storage::HistoryStorage;
use log::{debug, info};
use parking_lot::Mutex;
use std::sync::Arc;

struct HistoryState {
    store: HistoryStore,
    dirty: bool,
}

/// Owns the per-user logs and the storage they are flushed to.
///
/// The state lock is only held for synchronous map operations and never
/// across an await point or a storage write, so tasks for different users
/// do not wait on each other beyond a map access.
pub struct HistoryManager {
    state: Mutex<HistoryState>,
    /// Serializes saves so a later snapshot never lands before an earlier one.
    save_lock: Mutex<()>,
    storage: Arc<dyn HistoryStorage>,
    retention: RetentionPolicy,
}

impl HistoryManager {
    /// Build a manager seeded from whatever `storage` currently holds.
    pub fn load(storage: Arc<dyn HistoryStorage>, retention: RetentionPolicy) -> Self {
        let store = storage.load();
        info!(
            "history manager initialized (users={}, max_entries_per_user={:?})",
            store.len(),
            retention.max_entries_per_user
        );
        Self {
            state: Mutex::new(HistoryState {
                store,
                dirty: false,
            }),
            save_lock: Mutex::new(()),
            storage,
            retention,
        }
    }

    /// Return a copy of the user's log, creating an empty one if absent.
    pub fn get_or_create(&self, user_id: &str) -> ConversationLog {
        let mut state = self.state.lock();
        if !state.store.contains(user_id) {
            debug!("creating conversation log (user_id={})", user_id);
            state.dirty = true;
        }
        state.store.entry(user_id).clone()
    }

    /// Add `entry` to the end of the user's log.
    pub fn append(&self, user_id: &str, entry: ConversationEntry) {
        let mut state = self.state.lock();
        let log = state.store.entry(user_id);
        log.push(entry);
        let trimmed = match self.retention.max_entries_per_user {
            Some(max) => log.truncate_front(max),
            None => 0,
        };
        let len = log.len();
        state.dirty = true;
        debug!(
            "appended conversation entry (user_id={}, len={}, trimmed={})",
            user_id, len, trimmed
        );
    }

    /// Replace the user's log with an empty one.
    pub fn reset(&self, user_id: &str) {
        let mut state = self.state.lock();
        state.store.reset(user_id);
        state.dirty = true;
        info!("conversation reset (user_id={})", user_id);
    }

    /// The last `n` entries of the user's log, oldest first. Never mutates.
    pub fn windowed(&self, user_id: &str, n: usize) -> Vec<ConversationEntry> {
        let state = self.state.lock();
        state
            .store
            .get(user_id)
            .map(|log| log.tail(n).to_vec())
            .unwrap_or_default()
    }

    /// True when in-memory state differs from the last flush.
    pub fn is_dirty(&self) -> bool {
        self.state.lock().dirty
    }

    /// Copy of the whole store.
    pub fn snapshot(&self) -> HistoryStore {
        self.state.lock().store.clone()
    }

    /// Write the full store to storage if anything changed since the last flush.
    ///
    /// The store is copied under the state lock and written after releasing
    /// it; changes made during the write leave the manager dirty.
    pub fn flush(&self) -> Result<(), HistoryError> {
        let _saving = self.save_lock.lock();
        let snapshot = {
            let mut state = self.state.lock();
            if !state.dirty {
                return Ok(());
            }
            state.dirty = false;
            state.store.clone()
        };
        if let Err(err) = self.storage.save(&snapshot) {
            self.state.lock().dirty = true;
            return Err(err);
        }
        Ok(())
    }
}
