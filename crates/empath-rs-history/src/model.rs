//! Conversation data model persisted in the history document.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire name used in prompts and in the history document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single turn. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    role: Role,
    content: String,
    /// ISO-8601 creation time.
    timestamp: String,
}

impl ConversationEntry {
    /// Create an entry stamped with the current UTC time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self::with_timestamp(
            role,
            content,
            Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        )
    }

    /// Create an entry with an explicit timestamp.
    pub fn with_timestamp(
        role: Role,
        content: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: timestamp.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

/// Ordered turns for one user. Append-only except for reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationLog {
    entries: Vec<ConversationEntry>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ConversationEntry) {
        self.entries.push(entry);
    }

    /// Drop the oldest entries so that at most `max` remain.
    pub fn truncate_front(&mut self, max: usize) -> usize {
        let excess = self.entries.len().saturating_sub(max);
        self.entries.drain(..excess);
        excess
    }

    /// The last `n` entries in append order.
    pub fn tail(&self, n: usize) -> &[ConversationEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<ConversationEntry>> for ConversationLog {
    fn from(entries: Vec<ConversationEntry>) -> Self {
        Self { entries }
    }
}

/// Mapping from user id to that user's log.
///
/// Keys are kept sorted so the serialized document is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryStore {
    logs: BTreeMap<String, ConversationLog>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: &str) -> Option<&ConversationLog> {
        self.logs.get(user_id)
    }

    /// Return the user's log, inserting an empty one if absent.
    pub fn entry(&mut self, user_id: &str) -> &mut ConversationLog {
        self.logs.entry(user_id.to_string()).or_default()
    }

    /// Replace the user's log with an empty one.
    pub fn reset(&mut self, user_id: &str) {
        self.logs.insert(user_id.to_string(), ConversationLog::new());
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.logs.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}
