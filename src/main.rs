//! Warden server binary.

mod cli;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden::{api, auth::jwt::AuthService, db::Store, utils::config::Config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warden=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("configuration error: {}", e))?;

    match cli.command {
        Some(Commands::Seed) => seed(config).await,
        None => serve(config).await,
    }
}

async fn open_store(config: &Config) -> anyhow::Result<Store> {
    if config.database.path != ":memory:" {
        if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
    }

    Ok(Store::new_local(&config.database.path).await?)
}

async fn seed(config: Config) -> anyhow::Result<()> {
    let store = open_store(&config).await?;
    let auth = AuthService::from_config(&config.auth)?;

    store.seed(&auth).await?;
    info!("database seeded at {}", config.database.path);

    Ok(())
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let store = Arc::new(open_store(&config).await?);
    let auth = Arc::new(AuthService::from_config(&config.auth)?);

    store.seed(&auth).await?;

    let state = AppState::new(config.clone(), store, auth);

    let cors = CorsLayer::new()
        .allow_origin("http://localhost:3000".parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    let app = api::routes::create_router(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("listening on {}", addr);

    // Audit delivery is best-effort across shutdown: queued writes that have
    // not drained when the process exits are dropped.
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}
