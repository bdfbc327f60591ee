//! Stripe Tiger - webhook server + trade machine
//!
//! Environment: see `BotConfig`. `PORT` (default 10000) is the listen port,
//! `RUST_LOG` (or `LOG_LEVEL`) the log filter.

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use stripe_tiger::api::{create_router, AppState};
use stripe_tiger::models::BotConfig;
use stripe_tiger::utils::constants::{APP_NAME, APP_VERSION};
use stripe_tiger::{
    scheduler, CommandHandler, DexExecutor, LogNotifier, MarketClient, Notifier,
    TelegramNotifier, TradeMachine,
};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = BotConfig::from_env()?;
    info!("🐯 {} v{} starting", APP_NAME, APP_VERSION);
    config.log_summary();

    // Telegram
    let telegram = config.telegram.token.as_deref().map(TelegramNotifier::new);
    if let (Some(tg), Some(endpoint)) = (&telegram, config.webhook_endpoint()) {
        if let Err(e) = tg
            .register_webhook(&endpoint, config.telegram.webhook_secret.as_deref())
            .await
        {
            warn!(code = e.code_str(), "⚠️ {}", e.message);
        }
    }
    let notifier: Arc<dyn Notifier> = match telegram {
        Some(tg) => Arc::new(tg),
        None => {
            warn!("⚠️ TELEGRAM_TOKEN not set; replies and alerts are logged only");
            Arc::new(LogNotifier)
        }
    };

    // Engine
    let mut engine = TradeMachine::new(
        config.engine.clone(),
        Arc::new(MarketClient::new()),
        notifier.clone(),
    )
    .with_storage(&config.storage);
    match DexExecutor::from_config(&config.live) {
        Ok(executor) => engine = engine.with_executor(Arc::new(executor)),
        Err(e) if config.engine.mode.is_live() => {
            warn!("⚠️ Live mode requested but executor not wired: {}", e)
        }
        Err(_) => {}
    }
    let engine = Arc::new(engine);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poller = scheduler::spawn(engine.clone(), shutdown_rx);

    // HTTP
    let commands = Arc::new(CommandHandler::new(
        engine.clone(),
        notifier,
        config.telegram.admin_chat_id,
    ));
    let state = Arc::new(AppState::new(
        engine.clone(),
        commands,
        config.telegram.webhook_secret.clone(),
    ));
    let app = create_router(state);

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("🚀 Listening on http://{}", addr);
    info!("Endpoints: GET / /health /status /profit /trades, POST /webhook");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Shutdown signal received, cleaning up...");
    let _ = shutdown_tx.send(true);
    if let Err(e) = poller.await {
        warn!("⚠️ Scheduler task ended abnormally: {}", e);
    }
    match engine.save_state() {
        Ok(()) => info!("💾 State saved ({})", engine.short_status()),
        Err(e) => warn!(code = e.code_str(), "⚠️ {}", e.message),
    }
    info!("👋 {} shutdown complete", APP_NAME);

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            EnvFilter::try_new(std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()))
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("⚠️ Ctrl+C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("⚠️ SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
