//! # Sitewatch
//!
//! A monitor for web announcement pages. Sites are scanned on a fixed
//! interval, new postings are deduplicated against a persistent ledger
//! and fanned out to Telegram chats and email recipients. A chat bot
//! manages subscriptions.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Extractor → Store (dedup) → Notifier
//!                          ↑
//!              Bot (poller + commands)
//! ```
//!
//! - [`fetcher`]: plain HTTP with a headless-Chrome fallback for
//!   JavaScript-rendered pages
//! - [`extract`]: list and detail page extraction heuristics
//! - [`store`]: the seen-item ledger and subscriptions, SQLite or
//!   Postgres
//! - [`notify`]: chat and email fanout with self-healing unsubscribe
//! - [`bot`]: long-poll command loop with a durable update cursor
//!
//! ## Quick Start
//!
//! ```bash
//! # One-off sweep
//! TELEGRAM_BOT_TOKEN=... sitewatch sweep
//!
//! # Run the monitor and the bot
//! TELEGRAM_BOT_TOKEN=... sitewatch run
//! ```

/// Application context and error handling.
pub mod app;

/// The chat bot: commands, keyboards, update polling.
pub mod bot;

/// Command-line interface definitions.
pub mod cli;

/// Configuration loaded from TOML with environment overrides.
pub mod config;

/// Core domain models (Site, ListItem, SeenItem).
pub mod domain;

/// HTML extraction heuristics.
pub mod extract;

/// Page fetching, static and rendered.
pub mod fetcher;

/// SMTP email delivery.
pub mod mailer;

/// Sweep orchestration.
pub mod monitor;

/// Notification formatting and fanout.
pub mod notify;

/// Persistence backends.
pub mod store;

/// Telegram Bot API client.
pub mod telegram;
