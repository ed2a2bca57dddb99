//! peerwatch bot
//!
//! Sends usage/expiry notices to linked chats and links chats to peers via
//! activation codes.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use peerwatch_bot::dispatcher::Dispatcher;
use peerwatch_bot::notifier::{Notifier, NotifierSettings};
use peerwatch_bot::storage::{PeerDatabase, PeerStore};
use peerwatch_bot::telegram::TelegramClient;
use peerwatch_bot::transport::Transport;
use peerwatch_core::config::load_config;
use peerwatch_core::tracing_init::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "peerwatch-bot")]
#[command(version, about = "peerwatch bot - subscription usage and expiry notices")]
struct Args {
    /// Path to the JSON config file (default: the global config, if present).
    #[arg(long, env = "PEERWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Database file path (overrides the config file).
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Log level filter (e.g. "info", "debug", "warn").
    #[arg(long, default_value = "info", env = "PEERWATCH_LOG_LEVEL")]
    log_level: String,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long, env = "PEERWATCH_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(
        &format!(
            "peerwatch_bot={level},peerwatch_core={level}",
            level = args.log_level
        ),
        args.log_json,
    );

    info!(version = env!("CARGO_PKG_VERSION"), "Starting peerwatch-bot");

    let mut config = load_config(args.config.as_deref())?;
    if let Some(path) = args.db_path {
        config.database.path = Some(path);
    }
    config.validate()?;

    let db_path = config
        .database_path()
        .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    info!(path = %db_path.display(), "Opening peer database");
    let db = PeerDatabase::open(&db_path).await?;

    let client = TelegramClient::new(&config.telegram.api_base_url, &config.telegram.bot_token)?;
    let me = client.get_me().await?;
    info!(
        bot_id = me.id,
        username = me.username.as_deref().unwrap_or_default(),
        "Authorized on account"
    );

    let webhook = client.get_webhook_info().await?;
    if !webhook.url.is_empty() {
        info!(url = %webhook.url, "Deleting active webhook before long polling");
        client.delete_webhook(true).await?;
    }

    let store: Arc<dyn PeerStore> = Arc::new(db);
    let transport: Arc<dyn Transport> = Arc::new(client);

    let notifier = Notifier::new(
        Arc::clone(&store),
        Arc::clone(&transport),
        NotifierSettings::from_config(&config),
    );
    let dispatcher = Dispatcher::new(
        store,
        transport,
        config.telegram.channel_id.clone(),
        config.telegram.poll_timeout_secs,
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let notifier_rx = shutdown_rx.clone();
    let notifier_handle = tokio::spawn(async move { notifier.run(notifier_rx).await });
    let dispatcher_handle = tokio::spawn(async move { dispatcher.run(shutdown_rx).await });

    #[cfg(unix)]
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    #[cfg(unix)]
    sd_notify::notify(true, &[sd_notify::NotifyState::Ready])?;

    #[cfg(unix)]
    let sigterm_future = sigterm.recv();
    #[cfg(not(unix))]
    let sigterm_future = std::future::pending::<Option<()>>();

    info!("peerwatch-bot ready");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C shutdown signal");
        }
        _ = sigterm_future => {
            info!("Received SIGTERM shutdown signal");
        }
    }

    // Both loops finish the message or sweep in hand, then return.
    let _ = shutdown_tx.send(true);
    let _ = notifier_handle.await;
    let _ = dispatcher_handle.await;

    info!("peerwatch-bot stopped");
    Ok(())
}
