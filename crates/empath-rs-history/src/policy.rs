//! Retention policy for stored conversation logs.

/// Bounds applied to a user's log whenever it grows.
///
/// The default keeps every entry; prompts are bounded separately by the
/// relay's window size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Maximum entries kept per user, oldest dropped first.
    pub max_entries_per_user: Option<usize>,
}

impl RetentionPolicy {
    /// Keep everything.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Keep at most `max` entries per user.
    pub fn capped(max: usize) -> Self {
        Self {
            max_entries_per_user: Some(max),
        }
    }
}
