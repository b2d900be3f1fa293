mod config;
mod document;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod routes;
mod state;
mod storage;
mod style;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::document::merge::MergePolicy;
use crate::llm_client::build_gateway;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::postgres::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Scrivener API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL-backed store
    let store = Arc::new(PgStore::connect(&config.database_url).await?);

    // Initialize the LLM gateway (empty gateway = rule-based extraction only)
    let gateway = Arc::new(build_gateway(&config));
    if gateway.is_empty() {
        info!("No LLM provider configured; extraction will use the rule-based path");
    } else {
        info!("LLM providers configured: {:?}", gateway.provider_names());
    }

    // Build app state
    let state = AppState {
        store,
        gateway,
        merge_policy: MergePolicy::default(),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
