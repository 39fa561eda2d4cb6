//! Long-poll loop over the Bot API with a durable update cursor.
//!
//! The cursor is persisted before an update is dispatched, so a crash
//! mid-handling skips the update instead of replaying it. When the bot
//! credential changes the cursor is reset, because update ids are
//! scoped to the credential.

use std::sync::Arc;
use std::time::Duration;

use crate::app::Result;
use crate::bot::commands::CommandProcessor;
use crate::domain::text_hash;
use crate::store::{self, Store, TOKEN_HASH_KEY};
use crate::telegram::TelegramClient;

const POLL_TIMEOUT_SECS: u64 = 25;
const BACKOFF_MIN: Duration = Duration::from_secs(1);
const BACKOFF_MAX: Duration = Duration::from_secs(60);

/// Short stable fingerprint of the bot credential. Only the
/// fingerprint is ever persisted, never the token.
pub fn credential_fingerprint(token: &str) -> String {
    text_hash(token)[..16].to_string()
}

/// Drop the update cursor when the stored credential fingerprint does
/// not match the current token, then record the new fingerprint.
pub async fn reset_cursor_on_token_rotation(store: &dyn Store, token: &str) -> Result<()> {
    let fingerprint = credential_fingerprint(token);
    let stored = store.get_state(TOKEN_HASH_KEY).await?;
    if stored.as_deref() != Some(fingerprint.as_str()) {
        if stored.is_some() {
            tracing::info!("bot credential changed, resetting update cursor");
        }
        store.del_state(store::UPDATE_OFFSET_KEY).await?;
        store.set_state(TOKEN_HASH_KEY, &fingerprint).await?;
    }
    Ok(())
}

pub struct UpdatePoller {
    store: Arc<dyn Store>,
    telegram: Arc<TelegramClient>,
    processor: CommandProcessor,
}

impl UpdatePoller {
    pub fn new(
        store: Arc<dyn Store>,
        telegram: Arc<TelegramClient>,
        processor: CommandProcessor,
    ) -> Self {
        Self {
            store,
            telegram,
            processor,
        }
    }

    /// One long-poll round trip. Returns the number of updates
    /// processed. The cursor only moves forward and is persisted
    /// before each update is handled.
    pub async fn poll_once(&self) -> Result<usize> {
        let mut offset = store::update_offset(self.store.as_ref()).await?;
        let updates = self.telegram.get_updates(offset + 1, POLL_TIMEOUT_SECS).await?;

        let mut processed = 0;
        for update in &updates {
            if update.update_id > offset {
                offset = update.update_id;
                store::set_update_offset(self.store.as_ref(), offset).await?;
            }
            if let Err(e) = self.processor.handle_update(update).await {
                tracing::warn!(update_id = update.update_id, error = %e, "update handling failed");
            }
            processed += 1;
        }
        Ok(processed)
    }

    /// Poll forever. Transient errors back off exponentially, bounded,
    /// and a successful round resets the backoff.
    pub async fn run(&self) {
        let mut backoff = BACKOFF_MIN;
        loop {
            match self.poll_once().await {
                Ok(n) => {
                    if n > 0 {
                        tracing::debug!(updates = n, "processed chat updates");
                    }
                    backoff = BACKOFF_MIN;
                }
                Err(e) => {
                    tracing::warn!(error = %e, delay_secs = backoff.as_secs(), "poll failed, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(BACKOFF_MAX);
                }
            }
        }
    }
}
