//! Notification fanout for newly seen postings: chat subscribers first,
//! then email recipients. Per-recipient failures never abort the
//! fanout.

pub mod format;

use std::sync::Arc;

use crate::app::Result;
use crate::domain::Site;
use crate::mailer::Mailer;
use crate::store::Store;
use crate::telegram::{SendOutcome, TelegramClient};

pub struct Notifier {
    store: Arc<dyn Store>,
    telegram: Arc<TelegramClient>,
    mailer: Option<Mailer>,
    global_recipients: Vec<String>,
}

impl Notifier {
    pub fn new(
        store: Arc<dyn Store>,
        telegram: Arc<TelegramClient>,
        mailer: Option<Mailer>,
        global_recipients: Vec<String>,
    ) -> Self {
        Self {
            store,
            telegram,
            mailer,
            global_recipients,
        }
    }

    /// Fan a new item out to every subscriber of `site`. A chat that
    /// rejects the message with 400/403 is unsubscribed from the site
    /// so it is not retried forever.
    pub async fn notify_new_item(
        &self,
        site: &Site,
        title: &str,
        url: &str,
        snippet: &str,
        date: Option<&str>,
    ) -> Result<()> {
        let text = format::format_chat_message(&site.name, title, url, snippet, date);

        for chat_id in self.store.subscribers(&site.url).await? {
            match self.telegram.send_message(chat_id, &text, None).await {
                Ok(SendOutcome::Delivered) => {}
                Ok(SendOutcome::BlockedRecipient) => {
                    tracing::info!(chat_id, site = %site.url, "recipient unreachable, unsubscribing");
                    if let Err(e) = self.store.remove_site_sub(chat_id, &site.url).await {
                        tracing::warn!(chat_id, error = %e, "failed to drop dead subscription");
                    }
                }
                Ok(SendOutcome::Failed) => {
                    tracing::warn!(chat_id, site = %site.url, "chat notification failed");
                }
                Err(e) => {
                    tracing::warn!(chat_id, error = %e, "chat notification errored");
                }
            }
        }

        self.notify_emails(site, title, url, snippet, date).await;
        Ok(())
    }

    async fn notify_emails(&self, site: &Site, title: &str, url: &str, snippet: &str, date: Option<&str>) {
        let Some(ref mailer) = self.mailer else {
            return;
        };

        let mut recipients = match self.store.emails_for_site(&site.url).await {
            Ok(emails) => emails,
            Err(e) => {
                tracing::warn!(site = %site.url, error = %e, "failed to load email recipients");
                Vec::new()
            }
        };
        recipients.extend(self.global_recipients.iter().cloned());
        recipients.sort();
        recipients.dedup();

        if recipients.is_empty() {
            return;
        }

        let subject = format!("New posting - {}", site.name);
        let html = format::email_html(&site.name, title, url, snippet, date);
        for to in &recipients {
            if let Err(e) = mailer.send_html(to, &subject, &html).await {
                tracing::warn!(to, error = %e, "email notification failed");
            }
        }
    }
}
