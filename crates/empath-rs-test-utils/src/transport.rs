use async_trait::async_trait;
use empath_rs_core::{ChatId, EditOutcome, MessageHandle, Transport, TransportError};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEdit {
    pub handle: MessageHandle,
    pub text: String,
    pub outcome: EditOutcome,
}

#[derive(Debug, Default)]
struct TransportState {
    next_message_id: i64,
    sent: Vec<(ChatId, String)>,
    edits: Vec<RecordedEdit>,
    current: HashMap<MessageHandle, String>,
    scripted_edits: VecDeque<EditOutcome>,
    fail_sends: bool,
}

/// Transport double that behaves like the bot API for edits: editing a
/// message to its current text reports `NotModified`.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    state: Arc<Mutex<TransportState>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `send_text` fails with a rejection.
    pub fn failing_sends() -> Self {
        let transport = Self::default();
        transport.state.lock().fail_sends = true;
        transport
    }

    /// Queue outcomes returned by the next edits instead of the default behavior.
    pub fn script_edits(&self, outcomes: impl IntoIterator<Item = EditOutcome>) {
        self.state.lock().scripted_edits.extend(outcomes);
    }

    pub fn sent(&self) -> Vec<(ChatId, String)> {
        self.state.lock().sent.clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.state
            .lock()
            .sent
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub fn edits(&self) -> Vec<RecordedEdit> {
        self.state.lock().edits.clone()
    }

    /// Text currently shown for a sent message.
    pub fn current_text(&self, handle: MessageHandle) -> Option<String> {
        self.state.lock().current.get(&handle).cloned()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
    ) -> Result<MessageHandle, TransportError> {
        let mut state = self.state.lock();
        if state.fail_sends {
            return Err(TransportError::Rejected("sends disabled".to_string()));
        }
        state.next_message_id += 1;
        let handle = MessageHandle {
            chat_id,
            message_id: state.next_message_id,
        };
        state.sent.push((chat_id, text.to_string()));
        state.current.insert(handle, text.to_string());
        Ok(handle)
    }

    async fn edit_text(&self, handle: MessageHandle, text: &str) -> EditOutcome {
        let mut state = self.state.lock();
        let outcome = match state.scripted_edits.pop_front() {
            Some(outcome) => outcome,
            None => match state.current.get(&handle) {
                None => EditOutcome::Failed("message to edit not found".to_string()),
                Some(current) if current == text => EditOutcome::NotModified,
                Some(_) => EditOutcome::Applied,
            },
        };
        if outcome == EditOutcome::Applied {
            state.current.insert(handle, text.to_string());
        }
        state.edits.push(RecordedEdit {
            handle,
            text: text.to_string(),
            outcome: outcome.clone(),
        });
        outcome
    }
}
