//! Relay core for Empath.
//!
//! This crate owns the message-handling flow: it turns inbound chat messages
//! into windowed completion requests, renders streamed replies as a small
//! number of message edits, and records both turns in the history manager.

pub mod command;
pub mod completion;
pub mod error;
pub mod prompts;
pub mod relay;
pub mod render;
pub mod transport;

pub use command::Command;
pub use completion::{
    CompletionClient, FragmentStream, LlmCompletionClient, PromptMessage, build_llm_provider,
    build_prompt,
};
pub use error::{CompletionError, RelayError, TransportError};
pub use relay::{HandledMessage, InboundMessage, Relay, RelayOptions};
pub use render::{RenderOutcome, RenderState, StreamRenderer};
pub use transport::{ChatId, EditOutcome, MessageHandle, Transport};
