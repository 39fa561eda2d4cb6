//! Persistence: the seen-item ledger, subscriptions and bot state.
//!
//! The backend is selected explicitly in the configuration; both
//! backends implement the same [`Store`] trait.

pub mod postgres;
pub mod sqlite;

pub use postgres::PgStore;
pub use sqlite::SqliteStore;

use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::app::{Result, SitewatchError};
use crate::domain::SeenItem;

/// Key under which the last processed chat update id is persisted.
pub const UPDATE_OFFSET_KEY: &str = "update_offset";
/// Key under which the fingerprint of the bot credential is persisted.
pub const TOKEN_HASH_KEY: &str = "token_hash";

/// Bounds for the `/last` item count.
pub const RECENT_MIN: u32 = 1;
pub const RECENT_MAX: u32 = 20;
pub const RECENT_DEFAULT: u32 = 5;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());

/// Validate an address and return it in canonical (lowercase) form.
pub fn canonical_email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(SitewatchError::InvalidEmail(raw.trim().to_string()));
    }
    Ok(email)
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Insert an item into the seen ledger if it is not already there.
    /// Returns `true` when this call inserted the row. Insert and check
    /// are one atomic statement, so concurrent observers of the same
    /// item produce exactly one `true`.
    async fn insert_seen(&self, site_url: &str, item_hash: &str, title: &str, url: &str)
        -> Result<bool>;

    /// Most recent items from sites the user is subscribed to, newest
    /// first, optionally restricted further to the given site URLs.
    /// `limit` is clamped to [`RECENT_MIN`]..=[`RECENT_MAX`].
    async fn recent_items_for_user(
        &self,
        chat_id: i64,
        limit: u32,
        site_urls: Option<&[String]>,
    ) -> Result<Vec<SeenItem>>;

    /// Register or refresh a chat user. An empty `display_name` never
    /// overwrites a stored non-empty one.
    async fn upsert_user(&self, chat_id: i64, display_name: &str) -> Result<()>;

    /// Flip a site subscription. Returns the new state: `true` when the
    /// call subscribed, `false` when it unsubscribed.
    async fn toggle_site_sub(&self, chat_id: i64, site_url: &str) -> Result<bool>;

    async fn user_subs(&self, chat_id: i64) -> Result<HashSet<String>>;

    /// Chat ids subscribed to a site.
    async fn subscribers(&self, site_url: &str) -> Result<Vec<i64>>;

    /// Drop one user's subscription to one site. Used by the
    /// self-healing unsubscribe path.
    async fn remove_site_sub(&self, chat_id: i64, site_url: &str) -> Result<()>;

    /// Attach an email address to a chat. The address is validated and
    /// stored lowercase; duplicates are a no-op.
    async fn add_email(&self, chat_id: i64, email: &str) -> Result<()>;

    async fn remove_email(&self, chat_id: i64, email: &str) -> Result<()>;

    async fn list_emails(&self, chat_id: i64) -> Result<Vec<String>>;

    /// Distinct addresses of users subscribed to a site.
    async fn emails_for_site(&self, site_url: &str) -> Result<Vec<String>>;

    async fn get_state(&self, key: &str) -> Result<Option<String>>;
    async fn set_state(&self, key: &str, value: &str) -> Result<()>;
    async fn del_state(&self, key: &str) -> Result<()>;
}

/// Read the persisted update cursor, defaulting to 0.
pub async fn update_offset(store: &dyn Store) -> Result<i64> {
    Ok(store
        .get_state(UPDATE_OFFSET_KEY)
        .await?
        .and_then(|v| v.parse().ok())
        .unwrap_or(0))
}

pub async fn set_update_offset(store: &dyn Store, offset: i64) -> Result<()> {
    store.set_state(UPDATE_OFFSET_KEY, &offset.to_string()).await
}

pub(crate) fn clamp_recent_limit(limit: u32) -> u32 {
    limit.clamp(RECENT_MIN, RECENT_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_email_lowercases() {
        assert_eq!(canonical_email(" User@Example.COM ").unwrap(), "user@example.com");
    }

    #[test]
    fn test_canonical_email_rejects_garbage() {
        for bad in ["", "nope", "a@b", "a b@example.com", "@example.com"] {
            assert!(canonical_email(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_clamp_recent_limit() {
        assert_eq!(clamp_recent_limit(0), 1);
        assert_eq!(clamp_recent_limit(5), 5);
        assert_eq!(clamp_recent_limit(500), 20);
    }
}
