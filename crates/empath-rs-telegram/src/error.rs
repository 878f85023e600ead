use empath_rs_core::{EditOutcome, TransportError};
use thiserror::Error;

/// Bot API description returned when an edit would not change the message.
const NOT_MODIFIED_MARKER: &str = "message is not modified";

/// Errors raised while talking to the Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP request could not be completed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with `ok: false`.
    #[error("api error {code:?}: {description}")]
    Api {
        code: Option<i64>,
        description: String,
    },

    /// The API answered `ok: true` without a result payload.
    #[error("response for {0} had no result")]
    MissingResult(&'static str),
}

impl TelegramError {
    /// True when an edit was refused only because the text is unchanged.
    pub fn is_not_modified(&self) -> bool {
        match self {
            Self::Api { description, .. } => description.contains(NOT_MODIFIED_MARKER),
            _ => false,
        }
    }

    /// Outcome reported to the renderer for a failed edit.
    pub fn edit_outcome(&self) -> EditOutcome {
        if self.is_not_modified() {
            EditOutcome::NotModified
        } else {
            EditOutcome::Failed(self.to_string())
        }
    }
}

impl From<TelegramError> for TransportError {
    fn from(err: TelegramError) -> Self {
        match err {
            TelegramError::Request(err) => TransportError::Network(err.to_string()),
            other => TransportError::Rejected(other.to_string()),
        }
    }
}
