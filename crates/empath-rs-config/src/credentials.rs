//! Credential lookup from the process environment.

use crate::ConfigError;
use log::debug;
use std::fmt;

/// Environment variable holding the completion service API key.
pub const COMPLETION_API_KEY_ENV: &str = "GROQ_API_KEY";
/// Environment variable holding the Telegram bot token.
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Secrets needed at startup. Both are mandatory.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub completion_api_key: String,
    pub bot_token: String,
}

impl Credentials {
    /// Read both credentials from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve credentials through an arbitrary lookup; empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingCredential(name))
        };
        let completion_api_key = read(COMPLETION_API_KEY_ENV)?;
        let bot_token = read(BOT_TOKEN_ENV)?;
        debug!("credentials resolved from environment");
        Ok(Self {
            completion_api_key,
            bot_token,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("completion_api_key", &"[REDACTED]")
            .field("bot_token", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{BOT_TOKEN_ENV, COMPLETION_API_KEY_ENV, Credentials};
    use crate::ConfigError;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn resolves_both_credentials() {
        let creds = Credentials::from_lookup(lookup(&[
            (COMPLETION_API_KEY_ENV, "gsk_test"),
            (BOT_TOKEN_ENV, "123:abc"),
        ]))
        .expect("credentials");
        assert_eq!(creds.completion_api_key, "gsk_test");
        assert_eq!(creds.bot_token, "123:abc");
    }

    #[test]
    fn missing_bot_token_is_reported_by_name() {
        let err = Credentials::from_lookup(lookup(&[(COMPLETION_API_KEY_ENV, "gsk_test")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(BOT_TOKEN_ENV)));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let err = Credentials::from_lookup(lookup(&[
            (COMPLETION_API_KEY_ENV, "   "),
            (BOT_TOKEN_ENV, "123:abc"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(COMPLETION_API_KEY_ENV));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let creds = Credentials {
            completion_api_key: "gsk_secret".to_string(),
            bot_token: "123:secret".to_string(),
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
