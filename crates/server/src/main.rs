mod config;
mod http;
mod state;

use adapter::{
    AkismetClassifier, AkismetConfig, DisabledClassifier, HttpPricing, LogSink, NotificationSink,
    SpamClassifier, WebhookSink,
};
use anyhow::Context;
use dotenvy::dotenv;
use engine::{AdmissionEngine, VoteLedger};
use std::{net::SocketAddr, sync::Arc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{secs, Settings};
use crate::http::router::build_router;
use crate::state::AppState;
use storage::{Db, StoreOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::new().context("Failed to load configuration")?;

    let db = Db::with_options(
        &settings.database.url,
        StoreOptions {
            max_connections: settings.database.max_connections,
            timeout: secs(settings.database.timeout_secs),
        },
    )
    .await
    .context("Failed to open database")?;

    let spam: Arc<dyn SpamClassifier> = match settings.spam.akismet_key() {
        Some(key) => Arc::new(AkismetClassifier::new(AkismetConfig {
            api_key: key.to_string(),
            site_url: settings.spam.site_url.clone(),
            timeout: secs(settings.spam.timeout_secs),
        })?),
        None => {
            info!("No Akismet key configured, spam checking disabled");
            Arc::new(DisabledClassifier)
        }
    };

    let pricing = Arc::new(HttpPricing::new(
        settings.pricing.url.clone(),
        secs(settings.pricing.timeout_secs),
    )?);

    let sink: Arc<dyn NotificationSink> = match settings.notify.webhook_url() {
        Some(url) => Arc::new(WebhookSink::new(url, secs(settings.notify.timeout_secs))?),
        None => Arc::new(LogSink),
    };

    let (tx_events, rx_events) = mpsc::channel(settings.notify.queue_capacity.max(1));
    let cancel_token = CancellationToken::new();

    let db_for_worker = db.clone();
    let token_for_worker = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) =
            adapter::start_notifier(db_for_worker, rx_events, sink, token_for_worker).await
        {
            tracing::error!("Notification worker crashed: {:?}", e);
        }
    });

    let state = AppState {
        admission: AdmissionEngine::new(db.clone(), spam, pricing, tx_events),
        votes: VoteLedger::new(db),
    };

    let app = build_router(state, &settings.server.cors_origins);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    cancel_token.cancel();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
