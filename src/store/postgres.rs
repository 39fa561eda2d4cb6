use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;

use crate::app::Result;
use crate::domain::SeenItem;
use crate::store::{canonical_email, clamp_recent_limit, Store};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS seen_item (
    id BIGSERIAL PRIMARY KEY,
    site_url TEXT NOT NULL,
    item_hash TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL DEFAULT '',
    url TEXT NOT NULL UNIQUE,
    first_seen TIMESTAMPTZ NOT NULL
);
CREATE TABLE IF NOT EXISTS users (
    chat_id BIGINT PRIMARY KEY,
    display_name TEXT NOT NULL DEFAULT '',
    first_seen TIMESTAMPTZ NOT NULL
);
CREATE TABLE IF NOT EXISTS site_subs (
    chat_id BIGINT NOT NULL,
    site_url TEXT NOT NULL,
    PRIMARY KEY (chat_id, site_url)
);
CREATE TABLE IF NOT EXISTS email_subs (
    chat_id BIGINT NOT NULL,
    email TEXT NOT NULL,
    PRIMARY KEY (chat_id, email)
);
CREATE TABLE IF NOT EXISTS bot_state (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS ix_seen_item_site ON seen_item (site_url);
CREATE INDEX IF NOT EXISTS ix_site_subs_site ON site_subs (site_url);
";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    fn row_to_item(row: &sqlx::postgres::PgRow) -> SeenItem {
        SeenItem {
            site_url: row.get("site_url"),
            item_hash: row.get("item_hash"),
            title: row.get("title"),
            url: row.get("url"),
            first_seen: row.get::<DateTime<Utc>, _>("first_seen"),
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_seen(
        &self,
        site_url: &str,
        item_hash: &str,
        title: &str,
        url: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO seen_item (site_url, item_hash, title, url, first_seen)
             VALUES ($1, $2, $3, $4, $5) ON CONFLICT DO NOTHING",
        )
        .bind(site_url)
        .bind(item_hash)
        .bind(title)
        .bind(url)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn recent_items_for_user(
        &self,
        chat_id: i64,
        limit: u32,
        site_urls: Option<&[String]>,
    ) -> Result<Vec<SeenItem>> {
        let limit = i64::from(clamp_recent_limit(limit));
        let rows = match site_urls {
            Some(urls) => {
                if urls.is_empty() {
                    return Ok(Vec::new());
                }
                sqlx::query(
                    "SELECT i.site_url, i.item_hash, i.title, i.url, i.first_seen
                     FROM seen_item i
                     JOIN site_subs s ON s.site_url = i.site_url AND s.chat_id = $1
                     WHERE i.site_url = ANY($2) ORDER BY i.id DESC LIMIT $3",
                )
                .bind(chat_id)
                .bind(urls)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT i.site_url, i.item_hash, i.title, i.url, i.first_seen
                     FROM seen_item i
                     JOIN site_subs s ON s.site_url = i.site_url AND s.chat_id = $1
                     ORDER BY i.id DESC LIMIT $2",
                )
                .bind(chat_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows.iter().map(Self::row_to_item).collect())
    }

    async fn upsert_user(&self, chat_id: i64, display_name: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (chat_id, display_name, first_seen) VALUES ($1, $2, $3)
             ON CONFLICT (chat_id) DO UPDATE SET display_name =
                 CASE WHEN excluded.display_name <> '' THEN excluded.display_name
                      ELSE users.display_name END",
        )
        .bind(chat_id)
        .bind(display_name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn toggle_site_sub(&self, chat_id: i64, site_url: &str) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM site_subs WHERE chat_id = $1 AND site_url = $2")
            .bind(chat_id)
            .bind(site_url)
            .execute(&self.pool)
            .await?;
        if removed.rows_affected() > 0 {
            return Ok(false);
        }
        sqlx::query("INSERT INTO site_subs (chat_id, site_url) VALUES ($1, $2)")
            .bind(chat_id)
            .bind(site_url)
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    async fn user_subs(&self, chat_id: i64) -> Result<HashSet<String>> {
        let rows = sqlx::query("SELECT site_url FROM site_subs WHERE chat_id = $1")
            .bind(chat_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|r| r.get("site_url")).collect())
    }

    async fn subscribers(&self, site_url: &str) -> Result<Vec<i64>> {
        let rows =
            sqlx::query("SELECT chat_id FROM site_subs WHERE site_url = $1 ORDER BY chat_id")
                .bind(site_url)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.iter().map(|r| r.get("chat_id")).collect())
    }

    async fn remove_site_sub(&self, chat_id: i64, site_url: &str) -> Result<()> {
        sqlx::query("DELETE FROM site_subs WHERE chat_id = $1 AND site_url = $2")
            .bind(chat_id)
            .bind(site_url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn add_email(&self, chat_id: i64, email: &str) -> Result<()> {
        let email = canonical_email(email)?;
        sqlx::query(
            "INSERT INTO email_subs (chat_id, email) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(chat_id)
        .bind(email)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_email(&self, chat_id: i64, email: &str) -> Result<()> {
        sqlx::query("DELETE FROM email_subs WHERE chat_id = $1 AND email = $2")
            .bind(chat_id)
            .bind(email.trim().to_lowercase())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_emails(&self, chat_id: i64) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT email FROM email_subs WHERE chat_id = $1 ORDER BY email")
            .bind(chat_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|r| r.get("email")).collect())
    }

    async fn emails_for_site(&self, site_url: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT e.email FROM email_subs e
             JOIN site_subs s ON s.chat_id = e.chat_id
             WHERE s.site_url = $1 ORDER BY e.email",
        )
        .bind(site_url)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|r| r.get("email")).collect())
    }

    async fn get_state(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM bot_state WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("value")))
    }

    async fn set_state(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO bot_state (key, value) VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn del_state(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM bot_state WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
