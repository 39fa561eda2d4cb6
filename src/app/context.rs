use std::sync::Arc;

use crate::app::error::{Result, SitewatchError};
use crate::config::{load_sites, Config, StorageBackend};
use crate::domain::Site;
use crate::store::{PgStore, SqliteStore, Store};

/// Shared application state: the immutable configuration, the site
/// list and the selected store backend.
pub struct AppContext {
    pub config: Config,
    pub sites: Vec<Site>,
    pub store: Arc<dyn Store>,
}

impl AppContext {
    pub async fn new(config: Config) -> Result<Self> {
        let sites = load_sites(&config.sites_file)?;

        let store: Arc<dyn Store> = match config.storage.backend {
            StorageBackend::Sqlite => {
                let path = match config.storage.db_path.clone() {
                    Some(p) => p,
                    None => Config::default_db_path()?,
                };
                Arc::new(SqliteStore::new(path)?)
            }
            StorageBackend::Postgres => {
                let url = config.storage.database_url.as_deref().ok_or_else(|| {
                    SitewatchError::Config(
                        "postgres backend selected but no database_url configured".to_string(),
                    )
                })?;
                Arc::new(PgStore::connect(url).await?)
            }
        };

        Ok(Self {
            config,
            sites,
            store,
        })
    }

    /// Register the configured admin chat and subscribe it to every
    /// site it is not subscribed to yet.
    pub async fn seed_admin(&self) -> Result<()> {
        let Some(chat_id) = self.config.telegram.admin_chat_id else {
            return Ok(());
        };
        self.store.upsert_user(chat_id, "admin").await?;

        let subs = self.store.user_subs(chat_id).await?;
        for site in &self.sites {
            if !subs.contains(&site.url) {
                self.store.toggle_site_sub(chat_id, &site.url).await?;
            }
        }
        tracing::info!(chat_id, "admin chat seeded");
        Ok(())
    }
}
