//! Configuration schema for Empath.

use serde::{Deserialize, Serialize};

/// Root config for the Empath relay.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EmpathConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

impl EmpathConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> EmpathConfigBuilder {
        EmpathConfigBuilder::new()
    }
}

/// Builder for assembling an `EmpathConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct EmpathConfigBuilder {
    config: EmpathConfig,
}

impl EmpathConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: EmpathConfig::default(),
        }
    }

    /// Replace the history persistence configuration.
    pub fn history(mut self, history: HistoryConfig) -> Self {
        self.config.history = history;
        self
    }

    /// Replace the completion request configuration.
    pub fn completion(mut self, completion: CompletionConfig) -> Self {
        self.config.completion = completion;
        self
    }

    /// Replace the relay configuration.
    pub fn relay(mut self, relay: RelayConfig) -> Self {
        self.config.relay = relay;
        self
    }

    /// Replace the Telegram transport configuration.
    pub fn telegram(mut self, telegram: TelegramConfig) -> Self {
        self.config.telegram = telegram;
        self
    }

    /// Finalize and return the built `EmpathConfig`.
    pub fn build(self) -> EmpathConfig {
        self.config
    }
}

/// Where and how conversation history is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Path of the JSON history document.
    #[serde(default = "default_history_path")]
    pub path: String,
    /// Optional cap on stored entries per user; oldest entries are dropped first.
    #[serde(default)]
    pub max_entries_per_user: Option<usize>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: default_history_path(),
            max_entries_per_user: None,
        }
    }
}

fn default_history_path() -> String {
    "conversation_history.json".to_string()
}

/// Generation parameters sent with every completion request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CompletionConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    /// Stream fragments and render them as message edits.
    #[serde(default = "default_stream")]
    pub stream: bool,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            stream: default_stream(),
        }
    }
}

fn default_model() -> String {
    "llama-3.1-70b-versatile".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    150
}

fn default_top_p() -> f32 {
    1.0
}

fn default_stream() -> bool {
    true
}

/// Prompt windowing and stream rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Number of most recent turns included in each prompt.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Buffered characters required before an edit is issued.
    #[serde(default = "default_update_threshold")]
    pub update_threshold: usize,
    /// Text of the message sent before the first fragment arrives.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            update_threshold: default_update_threshold(),
            placeholder: default_placeholder(),
        }
    }
}

fn default_window_size() -> usize {
    30
}

fn default_update_threshold() -> usize {
    10
}

fn default_placeholder() -> String {
    "...".to_string()
}

/// Bot API endpoint and long-polling settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Long-poll timeout passed to `getUpdates`.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    30
}
