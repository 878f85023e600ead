//! Message handling flow from inbound text to persisted reply.

use crate::command::Command;
use crate::completion::{CompletionClient, PromptMessage, build_prompt};
use crate::error::RelayError;
use crate::prompts::{PROCESSING_APOLOGY, RESET_CONFIRMATION, SYSTEM_PROMPT, WELCOME_MESSAGE};
use crate::render::StreamRenderer;
use crate::transport::{ChatId, Transport};
use empath_rs_config::EmpathConfig;
use empath_rs_history::{ConversationEntry, HistoryManager};
use log::{debug, error, info, warn};
use std::sync::Arc;

/// A text message received from the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Stable sender identifier; the history key.
    pub user_id: String,
    /// Chat the reply goes to.
    pub chat_id: ChatId,
    pub text: String,
}

/// What the relay did with an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandledMessage {
    /// Log reset and welcome sent.
    Started,
    /// Log reset and confirmation sent.
    Reset,
    /// A reply was produced and recorded.
    Answered { text: String },
    /// The turn failed; the user got an apology and no assistant turn was recorded.
    Failed,
    /// Unsupported command; nothing was done.
    Ignored,
}

/// Relay settings derived from config.
#[derive(Debug, Clone)]
pub struct RelayOptions {
    pub window_size: usize,
    pub stream: bool,
    pub system_prompt: String,
    /// Username commands may be addressed to as `/start@username`.
    pub bot_username: Option<String>,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            window_size: 30,
            stream: true,
            system_prompt: SYSTEM_PROMPT.to_string(),
            bot_username: None,
        }
    }
}

impl From<&EmpathConfig> for RelayOptions {
    fn from(config: &EmpathConfig) -> Self {
        Self {
            window_size: config.relay.window_size,
            stream: config.completion.stream,
            system_prompt: SYSTEM_PROMPT.to_string(),
            bot_username: None,
        }
    }
}

/// Handles one inbound message at a time per task; share it behind an `Arc`.
pub struct Relay {
    history: Arc<HistoryManager>,
    client: Arc<dyn CompletionClient>,
    renderer: StreamRenderer,
    options: RelayOptions,
}

impl Relay {
    pub fn new(
        history: Arc<HistoryManager>,
        client: Arc<dyn CompletionClient>,
        renderer: StreamRenderer,
        options: RelayOptions,
    ) -> Self {
        Self {
            history,
            client,
            renderer,
            options,
        }
    }

    /// Build a relay from config with the renderer settings it names.
    pub fn from_config(
        config: &EmpathConfig,
        history: Arc<HistoryManager>,
        client: Arc<dyn CompletionClient>,
    ) -> Self {
        let renderer = StreamRenderer::new(
            config.relay.update_threshold,
            config.relay.placeholder.clone(),
        );
        Self::new(history, client, renderer, RelayOptions::from(config))
    }

    /// Only accept `/name@username` commands addressed to this bot.
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.options.bot_username = Some(username.into());
        self
    }

    pub fn history(&self) -> &Arc<HistoryManager> {
        &self.history
    }

    /// Dispatch an inbound message. Never fails; problems are logged and
    /// surfaced to the user as fixed texts.
    pub async fn handle(
        &self,
        transport: &dyn Transport,
        message: InboundMessage,
    ) -> HandledMessage {
        match Command::parse(&message.text, self.options.bot_username.as_deref()) {
            Command::Start => {
                self.reset_and_reply(transport, &message, WELCOME_MESSAGE)
                    .await;
                HandledMessage::Started
            }
            Command::Reset => {
                self.reset_and_reply(transport, &message, RESET_CONFIRMATION)
                    .await;
                HandledMessage::Reset
            }
            Command::Text(text) => self.converse(transport, &message, text).await,
            Command::Unknown(name) => {
                debug!(
                    "ignoring unsupported command (user_id={}, command={})",
                    message.user_id, name
                );
                HandledMessage::Ignored
            }
            Command::Foreign(target) => {
                debug!(
                    "ignoring command addressed to another bot (user_id={}, target={})",
                    message.user_id, target
                );
                HandledMessage::Ignored
            }
        }
    }

    async fn reset_and_reply(
        &self,
        transport: &dyn Transport,
        message: &InboundMessage,
        reply: &str,
    ) {
        self.history.reset(&message.user_id);
        self.flush_history(&message.user_id);
        if let Err(err) = transport.send_text(message.chat_id, reply).await {
            warn!(
                "failed to send command reply (user_id={}, chat_id={}, error={})",
                message.user_id, message.chat_id, err
            );
        }
    }

    async fn converse(
        &self,
        transport: &dyn Transport,
        message: &InboundMessage,
        text: String,
    ) -> HandledMessage {
        let user_id = message.user_id.as_str();
        info!(
            "starting turn (user_id={}, chat_id={}, prompt_len={})",
            user_id,
            message.chat_id,
            text.len()
        );
        self.history.append(user_id, ConversationEntry::user(text));
        let window = self.history.windowed(user_id, self.options.window_size);
        let prompt = build_prompt(&self.options.system_prompt, &window);

        match self.generate(transport, message.chat_id, &prompt).await {
            Ok(answer) => {
                info!(
                    "completed turn (user_id={}, response_len={})",
                    user_id,
                    answer.len()
                );
                self.history
                    .append(user_id, ConversationEntry::assistant(answer.clone()));
                self.flush_history(user_id);
                HandledMessage::Answered { text: answer }
            }
            Err(err) => {
                error!("turn failed (user_id={}, error={})", user_id, err);
                self.flush_history(user_id);
                if let Err(err) = transport
                    .send_text(message.chat_id, PROCESSING_APOLOGY)
                    .await
                {
                    warn!(
                        "failed to send apology (user_id={}, error={})",
                        user_id, err
                    );
                }
                HandledMessage::Failed
            }
        }
    }

    async fn generate(
        &self,
        transport: &dyn Transport,
        chat_id: ChatId,
        prompt: &[PromptMessage],
    ) -> Result<String, RelayError> {
        if self.options.stream {
            let fragments = self.client.stream(prompt).await?;
            let outcome = self.renderer.render(transport, chat_id, fragments).await?;
            debug!(
                "stream rendered (chat_id={}, state={:?}, edits={})",
                chat_id, outcome.state, outcome.edits
            );
            Ok(outcome.text)
        } else {
            let answer = self.client.complete(prompt).await?;
            transport.send_text(chat_id, &answer).await?;
            Ok(answer)
        }
    }

    fn flush_history(&self, user_id: &str) {
        if let Err(err) = self.history.flush() {
            error!(
                "failed to persist history (user_id={}, error={})",
                user_id, err
            );
        }
    }
}
