use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, SitewatchError};
use crate::domain::SeenItem;
use crate::store::{canonical_email, clamp_recent_limit, Store};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| SitewatchError::Other(format!("migration failed: {}", e)))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SitewatchError::Other(format!("store lock poisoned: {}", e)))
    }

    fn parse_datetime(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
            .unwrap_or_else(Utc::now)
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn insert_seen(
        &self,
        site_url: &str,
        item_hash: &str,
        title: &str,
        url: &str,
    ) -> Result<bool> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO seen_item (site_url, item_hash, title, url, first_seen)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![site_url, item_hash, title, url, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted > 0)
    }

    async fn recent_items_for_user(
        &self,
        chat_id: i64,
        limit: u32,
        site_urls: Option<&[String]>,
    ) -> Result<Vec<SeenItem>> {
        let limit = clamp_recent_limit(limit);
        let conn = self.lock()?;

        let mut sql = String::from(
            "SELECT i.site_url, i.item_hash, i.title, i.url, i.first_seen FROM seen_item i
             JOIN site_subs s ON s.site_url = i.site_url AND s.chat_id = ?",
        );
        let mut values: Vec<Value> = vec![Value::from(chat_id)];
        if let Some(urls) = site_urls {
            if urls.is_empty() {
                return Ok(Vec::new());
            }
            let placeholders = vec!["?"; urls.len()].join(", ");
            sql.push_str(&format!(" WHERE i.site_url IN ({})", placeholders));
            values.extend(urls.iter().map(|u| Value::from(u.clone())));
        }
        sql.push_str(" ORDER BY i.id DESC LIMIT ?");
        values.push(Value::from(i64::from(limit)));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok(SeenItem {
                site_url: row.get(0)?,
                item_hash: row.get(1)?,
                title: row.get(2)?,
                url: row.get(3)?,
                first_seen: Self::parse_datetime(&row.get::<_, String>(4)?),
            })
        })?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    async fn upsert_user(&self, chat_id: i64, display_name: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO users (chat_id, display_name, first_seen) VALUES (?1, ?2, ?3)
             ON CONFLICT(chat_id) DO UPDATE SET display_name = excluded.display_name
             WHERE excluded.display_name <> ''",
            params![chat_id, display_name, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    async fn toggle_site_sub(&self, chat_id: i64, site_url: &str) -> Result<bool> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM site_subs WHERE chat_id = ?1 AND site_url = ?2",
            params![chat_id, site_url],
        )?;
        if removed > 0 {
            return Ok(false);
        }
        conn.execute(
            "INSERT INTO site_subs (chat_id, site_url) VALUES (?1, ?2)",
            params![chat_id, site_url],
        )?;
        Ok(true)
    }

    async fn user_subs(&self, chat_id: i64) -> Result<HashSet<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT site_url FROM site_subs WHERE chat_id = ?1")?;
        let rows = stmt.query_map(params![chat_id], |row| row.get::<_, String>(0))?;
        let mut subs = HashSet::new();
        for row in rows {
            subs.insert(row?);
        }
        Ok(subs)
    }

    async fn subscribers(&self, site_url: &str) -> Result<Vec<i64>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT chat_id FROM site_subs WHERE site_url = ?1 ORDER BY chat_id")?;
        let rows = stmt.query_map(params![site_url], |row| row.get::<_, i64>(0))?;
        let mut chats = Vec::new();
        for row in rows {
            chats.push(row?);
        }
        Ok(chats)
    }

    async fn remove_site_sub(&self, chat_id: i64, site_url: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM site_subs WHERE chat_id = ?1 AND site_url = ?2",
            params![chat_id, site_url],
        )?;
        Ok(())
    }

    async fn add_email(&self, chat_id: i64, email: &str) -> Result<()> {
        let email = canonical_email(email)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO email_subs (chat_id, email) VALUES (?1, ?2)",
            params![chat_id, email],
        )?;
        Ok(())
    }

    async fn remove_email(&self, chat_id: i64, email: &str) -> Result<()> {
        let email = email.trim().to_lowercase();
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM email_subs WHERE chat_id = ?1 AND email = ?2",
            params![chat_id, email],
        )?;
        Ok(())
    }

    async fn list_emails(&self, chat_id: i64) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT email FROM email_subs WHERE chat_id = ?1 ORDER BY email")?;
        let rows = stmt.query_map(params![chat_id], |row| row.get::<_, String>(0))?;
        let mut emails = Vec::new();
        for row in rows {
            emails.push(row?);
        }
        Ok(emails)
    }

    async fn emails_for_site(&self, site_url: &str) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT e.email FROM email_subs e
             JOIN site_subs s ON s.chat_id = e.chat_id
             WHERE s.site_url = ?1 ORDER BY e.email",
        )?;
        let rows = stmt.query_map(params![site_url], |row| row.get::<_, String>(0))?;
        let mut emails = Vec::new();
        for row in rows {
            emails.push(row?);
        }
        Ok(emails)
    }

    async fn get_state(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM bot_state WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    async fn set_state(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO bot_state (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    async fn del_state(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM bot_state WHERE key = ?1", params![key])?;
        Ok(())
    }
}
