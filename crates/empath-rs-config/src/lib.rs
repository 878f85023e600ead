//! Configuration models, layered config loading, and credential lookup.
//!
//! This crate owns the Empath config schema and validation used by the relay
//! and the binary. Secrets never live in config files; they are read from the
//! environment through [`Credentials`].

mod credentials;
mod error;
mod loader;
mod model;

/// Credentials required to reach the completion service and the bot API.
pub use credentials::{BOT_TOKEN_ENV, COMPLETION_API_KEY_ENV, Credentials};
/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Layered config types and loader options.
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
/// Configuration schema models.
pub use model::*;
