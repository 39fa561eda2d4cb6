//! The scan orchestrator: sweep the configured sites, push unseen
//! items through the dedup gate and hand new ones to the notifier.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app::Result;
use crate::config::ScanConfig;
use crate::domain::{text_hash, ListItem, Site};
use crate::extract::{extract_detail, extract_list_links, filter_links};
use crate::fetcher::{needs_rendering, HttpFetcher, RenderFetcher};
use crate::notify::Notifier;
use crate::store::Store;

/// Titles longer than this are cut before storage and notification.
const TITLE_MAX_CHARS: usize = 200;

pub struct ScanOrchestrator {
    store: Arc<dyn Store>,
    fetcher: HttpFetcher,
    renderer: RenderFetcher,
    notifier: Notifier,
    sites: Vec<Site>,
    scan: ScanConfig,
}

impl ScanOrchestrator {
    pub fn new(
        store: Arc<dyn Store>,
        fetcher: HttpFetcher,
        renderer: RenderFetcher,
        notifier: Notifier,
        sites: Vec<Site>,
        scan: ScanConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            renderer,
            notifier,
            sites,
            scan,
        }
    }

    /// Fetch a page statically, escalating to the browser when the
    /// result is a JavaScript shell or the static fetch fails.
    async fn fetch_page(&self, url: &str) -> Result<String> {
        match self.fetcher.fetch(url).await {
            Ok(html) if !needs_rendering(&html) => Ok(html),
            Ok(_) => {
                tracing::debug!(url, "static document is a script shell, rendering");
                self.renderer.fetch(url).await
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "static fetch failed, trying browser");
                self.renderer.fetch(url).await
            }
        }
    }

    /// Scan one site's list page. Returns the number of new items.
    /// Item-level failures are logged and skipped; the item stays
    /// unseen and is retried on the next sweep.
    pub async fn process_site(&self, site: &Site) -> Result<usize> {
        let html = self.fetch_page(&site.url).await?;
        let items = extract_list_links(&html, &site.list_selector, &site.item_link_selector, &site.url)?;
        let items = filter_links(
            items,
            site.include_url_regex.as_deref(),
            site.exclude_text_regex.as_deref(),
        )?;

        let mut new_count = 0;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(Duration::from_millis(self.scan.item_delay_ms)).await;
            }
            match self.process_item(site, item).await {
                Ok(true) => new_count += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(site = %site.url, url = %item.url, error = %e, "item failed");
                }
            }
        }
        tracing::info!(
            site = %site.name,
            checked = items.len(),
            new_items = new_count,
            "site checked"
        );
        Ok(new_count)
    }

    /// Push one candidate through the dedup gate. Returns `true` when
    /// the item was new and notifications went out.
    async fn process_item(&self, site: &Site, item: &ListItem) -> Result<bool> {
        let hash = text_hash(&item.url);

        let detail_html = self.fetch_page(&item.url).await?;
        let detail = extract_detail(&detail_html, site.detail_selector.as_deref(), self.scan.body_limit)?;

        let title = detail
            .title
            .unwrap_or_else(|| item.title.clone())
            .chars()
            .take(TITLE_MAX_CHARS)
            .collect::<String>();

        if !self.store.insert_seen(&site.url, &hash, &title, &item.url).await? {
            return Ok(false);
        }

        tracing::info!(site = %site.name, title = %title, url = %item.url, "new posting");
        self.notifier
            .notify_new_item(site, &title, &item.url, &detail.body, detail.date.as_deref())
            .await?;
        Ok(true)
    }

    /// One sweep over every configured site. Site-level failures are
    /// isolated.
    pub async fn sweep(&self) -> usize {
        let started = Instant::now();
        let mut total_new = 0;
        for site in &self.sites {
            match self.process_site(site).await {
                Ok(n) => total_new += n,
                Err(e) => {
                    tracing::warn!(site = %site.url, error = %e, "site sweep failed");
                }
            }
        }
        tracing::info!(
            sites = self.sites.len(),
            new_items = total_new,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "sweep finished"
        );
        total_new
    }

    /// Sweep forever with the configured interval between rounds.
    pub async fn run(&self) {
        loop {
            self.sweep().await;
            tokio::time::sleep(Duration::from_secs(self.scan.interval_secs)).await;
        }
    }
}
