mod annotator;
mod config;
mod error;
mod links;
mod platform;
mod server;
mod wikipedia;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::annotator::Annotator;
use crate::config::Config;
use crate::platform::telegram::{self, TelegramPublisher};
use crate::wikipedia::WikipediaClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,wikibot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Summary API: {}", config.wikipedia.api_url);
    info!("  Request timeout: {}s", config.wikipedia.timeout_secs);
    info!("  Allowed chats: {:?}", config.telegram.allowed_chat_ids);

    let bot = teloxide::Bot::new(&config.telegram.bot_token);
    let context = telegram::activate(&bot, &config.profile).await?;

    if let Some(server_config) = &config.server {
        let server_context = context.clone();
        let addr = server_config.listen_address;
        tokio::spawn(async move {
            if let Err(e) = server::serve(addr, server_context).await {
                error!("{:#}", e);
            }
        });
    }

    let fetcher = Arc::new(WikipediaClient::new(&config.wikipedia)?);
    let publisher = Arc::new(TelegramPublisher::new(bot.clone()));
    let annotator = Arc::new(Annotator::new(context, fetcher, publisher));
    info!("Bot user id: {}", annotator.context().bot_id);

    info!("Bot is starting...");
    telegram::run(bot, annotator, config.telegram.allowed_chat_ids).await?;

    Ok(())
}
