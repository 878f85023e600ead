//! Bot API HTTP client.

use crate::error::TelegramError;
use crate::types::{ApiResponse, EditMessageText, GetUpdates, Message, SendMessage, Update, User};
use async_trait::async_trait;
use empath_rs_config::TelegramConfig;
use empath_rs_core::{ChatId, EditOutcome, MessageHandle, Transport, TransportError};
use log::{debug, warn};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

/// Headroom over the long-poll timeout before the HTTP request gives up.
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(15);

const ALLOWED_UPDATES: &[&str] = &["message"];

/// Client for the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    /// `{api_base}/bot{token}`; never logged.
    endpoint: String,
    poll_timeout_secs: u64,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("endpoint", &"<redacted>")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig, bot_token: &str) -> Result<Self, TelegramError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs) + REQUEST_TIMEOUT_MARGIN)
            .build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/bot{}", config.api_base.trim_end_matches('/'), bot_token),
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    pub fn poll_timeout_secs(&self) -> u64 {
        self.poll_timeout_secs
    }

    async fn call<B, T>(&self, method: &'static str, body: &B) -> Result<T, TelegramError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.endpoint, method);
        let response: ApiResponse<T> = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await?
            .json()
            .await?;
        if !response.ok {
            return Err(TelegramError::Api {
                code: response.error_code,
                description: response
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }
        response.result.ok_or(TelegramError::MissingResult(method))
    }

    /// The bot's own account; its username addresses group commands.
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: self.poll_timeout_secs,
                allowed_updates: ALLOWED_UPDATES,
            },
        )
        .await
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message, TelegramError> {
        self.call("sendMessage", &SendMessage { chat_id, text }).await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<Message, TelegramError> {
        self.call(
            "editMessageText",
            &EditMessageText {
                chat_id,
                message_id,
                text,
            },
        )
        .await
    }
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
    ) -> Result<MessageHandle, TransportError> {
        match self.send_message(chat_id, text).await {
            Ok(message) => Ok(MessageHandle {
                chat_id: message.chat.id,
                message_id: message.message_id,
            }),
            Err(err) => {
                warn!("sendMessage failed (chat_id={}, error={})", chat_id, err);
                Err(err.into())
            }
        }
    }

    async fn edit_text(&self, handle: MessageHandle, text: &str) -> EditOutcome {
        match self
            .edit_message_text(handle.chat_id, handle.message_id, text)
            .await
        {
            Ok(_) => EditOutcome::Applied,
            Err(err) => {
                debug!(
                    "editMessageText refused (chat_id={}, message_id={}, error={})",
                    handle.chat_id, handle.message_id, err
                );
                err.edit_outcome()
            }
        }
    }
}
