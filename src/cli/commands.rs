use std::sync::Arc;
use std::time::Duration;

use crate::app::{AppContext, Result};
use crate::bot::{reset_cursor_on_token_rotation, CommandProcessor, UpdatePoller};
use crate::config::Config;
use crate::fetcher::{HttpFetcher, RenderFetcher};
use crate::mailer::Mailer;
use crate::monitor::ScanOrchestrator;
use crate::notify::Notifier;
use crate::telegram::TelegramClient;

struct Services {
    ctx: AppContext,
    telegram: Arc<TelegramClient>,
    orchestrator: ScanOrchestrator,
}

async fn build(config: Config) -> Result<Services> {
    let token = config.require_bot_token()?.to_string();
    let ctx = AppContext::new(config).await?;
    ctx.seed_admin().await?;
    reset_cursor_on_token_rotation(ctx.store.as_ref(), &token).await?;

    let telegram = Arc::new(TelegramClient::new(&token));

    let mailer = match ctx.config.smtp {
        Some(ref smtp) => Some(Mailer::new(smtp)?),
        None => None,
    };
    let global_recipients = ctx
        .config
        .smtp
        .as_ref()
        .map(|s| s.global_recipients.clone())
        .unwrap_or_default();

    let notifier = Notifier::new(ctx.store.clone(), telegram.clone(), mailer, global_recipients);
    let fetcher = HttpFetcher::new(
        &ctx.config.fetch.user_agent,
        Duration::from_secs(ctx.config.fetch.timeout_secs),
    );
    let renderer = RenderFetcher::new(Duration::from_millis(ctx.config.fetch.render_settle_ms));

    let orchestrator = ScanOrchestrator::new(
        ctx.store.clone(),
        fetcher,
        renderer,
        notifier,
        ctx.sites.clone(),
        ctx.config.scan.clone(),
    );

    Ok(Services {
        ctx,
        telegram,
        orchestrator,
    })
}

/// Run the periodic monitor and the chat bot until interrupted.
pub async fn run(config: Config) -> Result<()> {
    let services = build(config).await?;

    let processor = CommandProcessor::new(
        services.ctx.store.clone(),
        services.telegram.clone(),
        services.ctx.sites.clone(),
    );
    let poller = UpdatePoller::new(
        services.ctx.store.clone(),
        services.telegram.clone(),
        processor,
    );

    tracing::info!(sites = services.ctx.sites.len(), "sitewatch starting");
    tokio::spawn(async move { poller.run().await });
    services.orchestrator.run().await;
    Ok(())
}

/// Perform one sweep over every site and exit.
pub async fn sweep_once(config: Config) -> Result<()> {
    let services = build(config).await?;
    let new_items = services.orchestrator.sweep().await;
    println!("Sweep finished: {} new item(s)", new_items);
    Ok(())
}

/// Print the configured sites.
pub async fn list_sites(config: Config) -> Result<()> {
    let ctx = AppContext::new(config).await?;
    if ctx.sites.is_empty() {
        println!("No sites configured in {}", ctx.config.sites_file.display());
        return Ok(());
    }
    for site in &ctx.sites {
        println!("{}  {}", site.name, site.url);
    }
    Ok(())
}
