//! Adaptive Learning - AI-assisted study panels
//!
//! Serves a small web UI backed by a Gemini client, a quiz generator and a
//! persisted voice assistant conversation.

mod api;
mod config;
mod conversation;
mod db;
mod llm;
mod quiz;

use api::{create_router, AppState};
use config::AppConfig;
use conversation::TurnProcessor;
use db::Database;
use llm::{GeminiService, LlmService, LoggingService};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine; real environment variables still apply
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adaptive_learning=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env();

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;

    let gemini = GeminiService::new(
        config.llm.google_api_key.clone(),
        &config.llm.model,
        config.llm.gateway.as_deref(),
    )?;
    let llm: Arc<dyn LlmService> = Arc::new(LoggingService::new(Arc::new(gemini)));

    if config.llm.google_api_key.is_none() && config.llm.gateway.is_none() {
        tracing::warn!("No GOOGLE_API_KEY or LLM_GATEWAY configured; model-backed panels will fail");
    } else {
        tracing::info!(model = %llm.model_id(), "Gemini client initialized");
    }

    let conversation = TurnProcessor::new(db, llm.clone())?;
    let state = AppState::new(conversation, llm);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new().gzip(true).br(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Adaptive learning server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
