//! Completion client port and the LLM-backed implementation.

use crate::error::CompletionError;
use async_trait::async_trait;
use autoagents_llm::LLMProvider;
use autoagents_llm::backends::groq::Groq;
use autoagents_llm::builder::LLMBuilder;
use autoagents_llm::chat::{ChatMessage, ChatRole, MessageType};
use empath_rs_config::CompletionConfig;
use empath_rs_history::{ConversationEntry, Role};
use futures_util::{Stream, StreamExt};
use log::{debug, info};
use std::pin::Pin;
use std::sync::Arc;

/// Incremental text fragments of one generation. An `Err` item ends the stream abnormally.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, CompletionError>> + Send>>;

/// A `{role, content}` pair sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

impl From<&ConversationEntry> for PromptMessage {
    fn from(entry: &ConversationEntry) -> Self {
        Self::new(entry.role(), entry.content())
    }
}

/// System prompt followed by the windowed turns, timestamps stripped.
pub fn build_prompt(system_prompt: &str, window: &[ConversationEntry]) -> Vec<PromptMessage> {
    std::iter::once(PromptMessage::new(Role::System, system_prompt))
        .chain(window.iter().map(PromptMessage::from))
        .collect()
}

/// External text generation capability.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate one complete answer.
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, CompletionError>;

    /// Generate an answer as a stream of fragments.
    async fn stream(&self, messages: &[PromptMessage]) -> Result<FragmentStream, CompletionError>;
}

/// Completion client backed by an AutoAgents chat provider.
///
/// Generation parameters are fixed when the provider is built, see
/// [`build_llm_provider`].
#[derive(Clone)]
pub struct LlmCompletionClient {
    llm: Arc<dyn LLMProvider>,
}

impl LlmCompletionClient {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm }
    }
}

fn chat_role(role: Role) -> ChatRole {
    match role {
        Role::System => ChatRole::System,
        Role::User => ChatRole::User,
        Role::Assistant => ChatRole::Assistant,
    }
}

fn to_chat_messages(messages: &[PromptMessage]) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|message| ChatMessage {
            role: chat_role(message.role),
            message_type: MessageType::Text,
            content: message.content.clone(),
        })
        .collect()
}

#[async_trait]
impl CompletionClient for LlmCompletionClient {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, CompletionError> {
        debug!("requesting completion (messages={})", messages.len());
        let response = self
            .llm
            .chat_with_tools(&to_chat_messages(messages), None, None)
            .await
            .map_err(|err| CompletionError::Provider(err.to_string()))?;
        Ok(response.text().unwrap_or_default())
    }

    async fn stream(&self, messages: &[PromptMessage]) -> Result<FragmentStream, CompletionError> {
        debug!("requesting completion stream (messages={})", messages.len());
        let stream = self
            .llm
            .chat_stream(&to_chat_messages(messages), None)
            .await
            .map_err(|err| CompletionError::Provider(err.to_string()))?;
        Ok(Box::pin(stream.map(|item| {
            item.map_err(|err| CompletionError::Interrupted(err.to_string()))
        })))
    }
}

/// Build the hosted chat provider with the configured generation parameters.
pub fn build_llm_provider(
    config: &CompletionConfig,
    api_key: &str,
) -> Result<Arc<dyn LLMProvider>, CompletionError> {
    info!(
        "building completion provider (model={}, temperature={}, max_tokens={}, top_p={})",
        config.model, config.temperature, config.max_tokens, config.top_p
    );
    let llm: Arc<dyn LLMProvider> = LLMBuilder::<Groq>::new()
        .api_key(api_key)
        .model(config.model.clone())
        .temperature(config.temperature)
        .max_tokens(config.max_tokens)
        .top_p(config.top_p)
        .build()
        .map_err(|err| CompletionError::Setup(err.to_string()))?;
    Ok(llm)
}
