//! Renders a fragment stream as a few edits of one placeholder message.

use crate::completion::FragmentStream;
use crate::error::TransportError;
use crate::prompts::STREAM_APOLOGY;
use crate::transport::{ChatId, EditOutcome, MessageHandle, Transport};
use futures_util::StreamExt;
use log::{debug, warn};

/// Rendering lifecycle. `Done` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Init,
    Streaming,
    Flushing,
    Done,
    /// The stream failed before producing any text.
    Error,
}

/// Result of rendering one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutcome {
    /// Final displayed text; becomes the assistant turn.
    pub text: String,
    /// Terminal state.
    pub state: RenderState,
    /// Edit calls issued, whatever their outcome.
    pub edits: usize,
    /// Placeholder message that was edited.
    pub handle: MessageHandle,
}

/// Buffers fragments and edits the placeholder once `threshold` characters accumulate.
#[derive(Debug, Clone)]
pub struct StreamRenderer {
    threshold: usize,
    placeholder: String,
}

impl StreamRenderer {
    pub fn new(threshold: usize, placeholder: impl Into<String>) -> Self {
        Self {
            threshold: threshold.max(1),
            placeholder: placeholder.into(),
        }
    }

    /// Send the placeholder, then consume `fragments` into sequential edits.
    ///
    /// Only a failure to send the placeholder is returned as an error; edit
    /// failures and stream failures degrade to the best text available.
    pub async fn render(
        &self,
        transport: &dyn Transport,
        chat_id: ChatId,
        mut fragments: FragmentStream,
    ) -> Result<RenderOutcome, TransportError> {
        let handle = transport.send_text(chat_id, &self.placeholder).await?;
        let mut state = RenderState::Init;
        let mut displayed = String::new();
        let mut buffer = String::new();
        let mut buffered_chars = 0usize;
        let mut edits = 0usize;
        let mut interrupted = false;

        while let Some(item) = fragments.next().await {
            let fragment = match item {
                Ok(fragment) => fragment,
                Err(err) => {
                    warn!(
                        "completion stream ended abnormally (chat_id={}, shown_len={}, buffered_len={}, error={})",
                        chat_id,
                        displayed.len(),
                        buffer.len(),
                        err
                    );
                    interrupted = true;
                    break;
                }
            };
            if fragment.is_empty() {
                continue;
            }
            state = transition(state, RenderState::Streaming);
            buffered_chars += fragment.chars().count();
            buffer.push_str(&fragment);
            if buffered_chars >= self.threshold {
                displayed.push_str(&buffer);
                buffer.clear();
                buffered_chars = 0;
                edit(transport, handle, &displayed, &mut edits).await;
            }
        }

        displayed.push_str(&buffer);
        if !displayed.is_empty() {
            state = transition(state, RenderState::Flushing);
            edit(transport, handle, &displayed, &mut edits).await;
        }

        if interrupted && displayed.is_empty() {
            displayed = STREAM_APOLOGY.to_string();
            edit(transport, handle, &displayed, &mut edits).await;
            state = transition(state, RenderState::Error);
        } else {
            state = transition(state, RenderState::Done);
        }

        Ok(RenderOutcome {
            text: displayed,
            state,
            edits,
            handle,
        })
    }
}

fn transition(from: RenderState, to: RenderState) -> RenderState {
    if from != to {
        debug!("render state {:?} -> {:?}", from, to);
    }
    to
}

async fn edit(transport: &dyn Transport, handle: MessageHandle, text: &str, edits: &mut usize) {
    *edits += 1;
    match transport.edit_text(handle, text).await {
        EditOutcome::Applied => {}
        EditOutcome::NotModified => {
            debug!(
                "edit skipped, text unchanged (chat_id={}, message_id={})",
                handle.chat_id, handle.message_id
            );
        }
        EditOutcome::Failed(reason) => {
            warn!(
                "failed to edit streamed message (chat_id={}, message_id={}, reason={})",
                handle.chat_id, handle.message_id, reason
            );
        }
    }
}
