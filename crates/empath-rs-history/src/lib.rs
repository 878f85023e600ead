//! Per-user conversation history for Empath.
//!
//! Holds the conversation data model, the JSON document store that persists
//! it, and the [`HistoryManager`] that enforces append/reset/window semantics.

pub mod error;
pub mod manager;
pub mod model;
pub mod policy;
pub mod storage;

/// History error type.
pub use error::HistoryError;
/// In-memory manager mirroring the persistent store.
pub use manager::HistoryManager;
/// Conversation data model.
pub use model::{ConversationEntry, ConversationLog, HistoryStore, Role};
/// Retention policy applied on append.
pub use policy::RetentionPolicy;
/// Persistent store interface and the default JSON file implementation.
pub use storage::{HistoryStorage, JsonFileStorage};
