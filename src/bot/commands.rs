//! Chat command handling: slash commands and inline-keyboard
//! callbacks.

use std::sync::Arc;

use crate::app::{Result, SitewatchError};
use crate::bot::keyboard::{emails_keyboard, sites_keyboard};
use crate::domain::Site;
use crate::store::{Store, RECENT_DEFAULT};
use crate::telegram::{CallbackQuery, Message, TelegramClient, Update};

const HELP_TEXT: &str = "Commands:\n\
/sites - manage site subscriptions\n\
/emails - manage email addresses\n\
/email add you@example.com - add an address\n\
/email remove you@example.com - remove an address\n\
/last [n] [site:KEYWORD] - recent postings";

pub struct CommandProcessor {
    store: Arc<dyn Store>,
    telegram: Arc<TelegramClient>,
    sites: Vec<Site>,
}

/// Parsed arguments of `/last [n] [site:<keyword>]`.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct LastArgs {
    pub limit: u32,
    pub site_keyword: Option<String>,
}

pub(crate) fn parse_last_args(args: &str) -> LastArgs {
    let mut limit = RECENT_DEFAULT;
    let mut site_keyword = None;
    for token in args.split_whitespace() {
        if let Some(kw) = token.strip_prefix("site:") {
            if !kw.is_empty() {
                site_keyword = Some(kw.to_lowercase());
            }
        } else if let Ok(n) = token.parse::<u32>() {
            limit = n;
        }
    }
    LastArgs { limit, site_keyword }
}

impl CommandProcessor {
    pub fn new(store: Arc<dyn Store>, telegram: Arc<TelegramClient>, sites: Vec<Site>) -> Self {
        Self {
            store,
            telegram,
            sites,
        }
    }

    /// Dispatch one update. Unknown commands get the help text; updates
    /// carrying neither text nor a callback are ignored.
    pub async fn handle_update(&self, update: &Update) -> Result<()> {
        if let Some(ref message) = update.message {
            let display_name = message
                .from
                .as_ref()
                .and_then(|u| u.username.clone().or_else(|| u.first_name.clone()))
                .unwrap_or_default();
            self.store.upsert_user(message.chat.id, &display_name).await?;

            if let Some(ref text) = message.text {
                return self.handle_command(message, text.trim()).await;
            }
        }

        if let Some(ref callback) = update.callback_query {
            return self.handle_callback(callback).await;
        }

        Ok(())
    }

    async fn handle_command(&self, message: &Message, text: &str) -> Result<()> {
        let chat_id = message.chat.id;
        match text {
            "/start" => {
                self.telegram
                    .send_message(
                        chat_id,
                        &format!("Welcome! You will be notified about new postings.\n\n{}", HELP_TEXT),
                        None,
                    )
                    .await?;
                self.send_sites_menu(chat_id).await
            }
            "/sites" => self.send_sites_menu(chat_id).await,
            "/emails" => self.send_emails_menu(chat_id).await,
            _ if text.starts_with("/email ") => {
                self.handle_email_command(chat_id, &text["/email ".len()..]).await
            }
            _ if text == "/last" || text.starts_with("/last ") => {
                let args = text.strip_prefix("/last").unwrap_or_default();
                self.handle_last(chat_id, parse_last_args(args)).await
            }
            _ => {
                self.telegram.send_message(chat_id, HELP_TEXT, None).await?;
                Ok(())
            }
        }
    }

    async fn send_sites_menu(&self, chat_id: i64) -> Result<()> {
        let subs = self.store.user_subs(chat_id).await?;
        let kb = sites_keyboard(&subs, &self.sites);
        self.telegram
            .send_message(chat_id, "Tap a site to toggle its subscription:", Some(&kb))
            .await?;
        Ok(())
    }

    /// Text listing of the sites the user is currently subscribed to,
    /// in configured order.
    async fn send_subscription_list(&self, chat_id: i64) -> Result<()> {
        let subs = self.store.user_subs(chat_id).await?;
        let reply = if subs.is_empty() {
            "You are not subscribed to any site yet.".to_string()
        } else {
            let mut reply = String::from("Your subscriptions:\n");
            for site in self.sites.iter().filter(|s| subs.contains(&s.url)) {
                reply.push_str(&format!("• {}\n", site.name));
            }
            reply
        };
        self.telegram.send_message(chat_id, &reply, None).await?;
        Ok(())
    }

    async fn send_emails_menu(&self, chat_id: i64) -> Result<()> {
        let emails = self.store.list_emails(chat_id).await?;
        let (text, kb) = emails_keyboard(&emails);
        self.telegram.send_message(chat_id, &text, Some(&kb)).await?;
        Ok(())
    }

    async fn handle_email_command(&self, chat_id: i64, args: &str) -> Result<()> {
        let mut parts = args.split_whitespace();
        let action = parts.next().unwrap_or_default();
        let address = parts.next().unwrap_or_default();

        let reply = match action {
            "add" => match self.store.add_email(chat_id, address).await {
                Ok(()) => format!("Added {}", address.trim().to_lowercase()),
                Err(SitewatchError::InvalidEmail(bad)) => {
                    format!("That does not look like an email address: {}", bad)
                }
                Err(e) => return Err(e),
            },
            "remove" => {
                self.store.remove_email(chat_id, address).await?;
                format!("Removed {}", address.trim().to_lowercase())
            }
            _ => HELP_TEXT.to_string(),
        };
        self.telegram.send_message(chat_id, &reply, None).await?;
        Ok(())
    }

    async fn handle_last(&self, chat_id: i64, args: LastArgs) -> Result<()> {
        let site_urls = args.site_keyword.as_deref().map(|kw| {
            self.sites
                .iter()
                .filter(|s| {
                    s.name.to_lowercase().contains(kw) || s.url.to_lowercase().contains(kw)
                })
                .map(|s| s.url.clone())
                .collect::<Vec<_>>()
        });

        let items = self
            .store
            .recent_items_for_user(chat_id, args.limit, site_urls.as_deref())
            .await?;

        let reply = if items.is_empty() {
            "No postings from your subscribed sites yet. Use /sites to subscribe.".to_string()
        } else {
            let mut reply = String::from("Recent postings:\n");
            for item in &items {
                let name = self
                    .sites
                    .iter()
                    .find(|s| s.url == item.site_url)
                    .map(|s| s.name.as_str())
                    .unwrap_or(item.site_url.as_str());
                reply.push_str(&format!(
                    "• <a href=\"{}\">{}</a> ({})\n",
                    crate::notify::format::escape_html(&item.url),
                    crate::notify::format::escape_html(&item.title),
                    crate::notify::format::escape_html(name),
                ));
            }
            reply
        };
        self.telegram.send_message(chat_id, &reply, None).await?;
        Ok(())
    }

    async fn handle_callback(&self, callback: &CallbackQuery) -> Result<()> {
        let Some(chat_id) = callback.message.as_ref().map(|m| m.chat.id) else {
            return self.telegram.answer_callback(&callback.id, None).await;
        };
        let data = callback.data.as_deref().unwrap_or_default();

        match data {
            "list" => {
                self.telegram.answer_callback(&callback.id, None).await?;
                self.send_subscription_list(chat_id).await
            }
            "back" => {
                self.telegram.answer_callback(&callback.id, None).await?;
                self.send_sites_menu(chat_id).await
            }
            "emails" => {
                self.telegram.answer_callback(&callback.id, None).await?;
                self.send_emails_menu(chat_id).await
            }
            "noop" => self.telegram.answer_callback(&callback.id, None).await,
            _ if data.starts_with("emailrm|") => {
                let email = &data["emailrm|".len()..];
                self.store.remove_email(chat_id, email).await?;
                self.telegram
                    .answer_callback(&callback.id, Some("Removed"))
                    .await?;
                self.send_emails_menu(chat_id).await
            }
            _ if data.starts_with("tog|") => {
                let site_url = &data["tog|".len()..];
                if !self.sites.iter().any(|s| s.url == site_url) {
                    return self
                        .telegram
                        .answer_callback(&callback.id, Some("Unknown site"))
                        .await;
                }
                let subscribed = self.store.toggle_site_sub(chat_id, site_url).await?;
                let toast = if subscribed { "Subscribed" } else { "Unsubscribed" };
                self.telegram
                    .answer_callback(&callback.id, Some(toast))
                    .await?;
                self.send_sites_menu(chat_id).await
            }
            _ => self.telegram.answer_callback(&callback.id, None).await,
        }
    }
}
