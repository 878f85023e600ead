//! Test helpers shared across Empath crates.

pub mod llm;
pub mod storage;
pub mod transport;

pub use llm::{FailingLLM, FixedChatResponse, FixedLLM, FlakyStreamingLLM, StreamingLLM};
pub use storage::MemoryStorage;
pub use transport::{RecordedEdit, RecordingTransport};
