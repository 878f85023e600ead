//! Long-polling update loop that hands each message to the relay.

use crate::client::TelegramClient;
use crate::error::TelegramError;
use crate::types::Update;
use empath_rs_core::{InboundMessage, Relay};
use log::{debug, info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Drives `getUpdates` and spawns one task per inbound message.
pub struct Poller {
    client: Arc<TelegramClient>,
    relay: Arc<Relay>,
}

impl Poller {
    pub fn new(client: Arc<TelegramClient>, relay: Arc<Relay>) -> Self {
        Self { client, relay }
    }

    /// Poll until `shutdown` resolves, then wait for in-flight handlers.
    pub async fn run<F>(self, shutdown: F) -> Result<(), TelegramError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut offset: Option<i64> = None;
        let mut backoff = INITIAL_BACKOFF;
        let mut handlers = JoinSet::new();
        info!(
            "polling for updates (timeout_secs={})",
            self.client.poll_timeout_secs()
        );

        loop {
            let polled = tokio::select! {
                _ = &mut shutdown => break,
                polled = self.client.get_updates(offset) => polled,
            };
            match polled {
                Ok(updates) => {
                    backoff = INITIAL_BACKOFF;
                    offset = next_offset(offset, &updates);
                    for update in updates {
                        let update_id = update.update_id;
                        match update.into_inbound() {
                            Some(message) => self.dispatch(&mut handlers, message),
                            None => debug!("skipping non-text update (update_id={})", update_id),
                        }
                    }
                }
                Err(err) => {
                    warn!(
                        "getUpdates failed (backoff_ms={}, error={})",
                        backoff.as_millis(),
                        err
                    );
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
            while handlers.try_join_next().is_some() {}
        }

        info!("shutting down poller (in_flight={})", handlers.len());
        while let Some(joined) = handlers.join_next().await {
            if let Err(err) = joined {
                warn!("message handler panicked (error={})", err);
            }
        }
        Ok(())
    }

    fn dispatch(&self, handlers: &mut JoinSet<()>, message: InboundMessage) {
        let client = Arc::clone(&self.client);
        let relay = Arc::clone(&self.relay);
        handlers.spawn(async move {
            let user_id = message.user_id.clone();
            let handled = relay.handle(client.as_ref(), message).await;
            debug!("message handled (user_id={}, outcome={:?})", user_id, handled);
        });
    }
}

/// Offset acknowledging every update in `updates`.
pub fn next_offset(current: Option<i64>, updates: &[Update]) -> Option<i64> {
    updates
        .iter()
        .map(|update| update.update_id + 1)
        .max()
        .max(current)
}

#[cfg(test)]
mod tests {
    use super::next_offset;
    use crate::types::Update;
    use pretty_assertions::assert_eq;

    fn update(update_id: i64) -> Update {
        Update {
            update_id,
            message: None,
        }
    }

    #[test]
    fn offset_moves_past_highest_update() {
        assert_eq!(next_offset(None, &[update(10), update(12), update(11)]), Some(13));
    }

    #[test]
    fn empty_batch_keeps_offset() {
        assert_eq!(next_offset(Some(7), &[]), Some(7));
        assert_eq!(next_offset(None, &[]), None);
    }
}
