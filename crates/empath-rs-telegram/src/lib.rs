//! Telegram Bot API transport for Empath.
//!
//! Implements the relay's [`Transport`](empath_rs_core::Transport) port over
//! `sendMessage`/`editMessageText` and feeds `getUpdates` long-polling into
//! [`Relay::handle`](empath_rs_core::Relay::handle).

pub mod client;
pub mod error;
pub mod poller;
pub mod types;

pub use client::TelegramClient;
pub use error::TelegramError;
pub use poller::{Poller, next_offset};
pub use types::{ApiResponse, Chat, Message, Update, User};
