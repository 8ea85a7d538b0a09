//! services/superbrain/src/bin/superbrain.rs
//!
//! Composition root: wires the concrete adapters from environment
//! configuration, builds the whole-library context once, and reports its
//! statistics. The chat surfaces call into the library interface; this binary
//! exists to exercise the wiring end-to-end and to warm the cache.

use async_openai::{config::OpenAIConfig, Client};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use superbrain::{
    adapters::{HttpBlobStore, OpenAiChatAdapter, PdfTextExtractor, PgDocumentStore},
    BuildOptions, Config, ExtractionCache, HubError, Superbrain,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), HubError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting superbrain...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgDocumentStore::new(db_pool));
    info!("Running database migrations...");
    store
        .run_migrations()
        .await
        .map_err(|e| HubError::Internal(e.to_string()))?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let blobs = Arc::new(HttpBlobStore::new(reqwest::Client::new()));
    let extractor = Arc::new(PdfTextExtractor::new());

    // The chat adapter is only needed by the chat surfaces, but constructing
    // it here validates the key and model configuration at startup.
    if let Some(api_key) = config.openai_api_key.as_ref() {
        let openai_client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));
        let _chat_adapter = OpenAiChatAdapter::new(
            openai_client,
            config.chat_model.clone(),
            config.persona.clone(),
        );
        info!("Chat adapter configured for model '{}'.", config.chat_model);
    } else {
        info!("OPENAI_API_KEY not set; chat adapter skipped.");
    }

    // --- 4. Build the Superbrain and Warm the Library Context ---
    let cache = Arc::new(ExtractionCache::new(
        blobs,
        extractor,
        Duration::from_secs(config.extraction_timeout_secs),
        config.min_extracted_chars,
    ));
    let brain = Superbrain::new(
        store,
        cache,
        config.extraction_concurrency,
        BuildOptions {
            char_budget: config.aggregate_char_budget,
        },
    );

    let context = brain.context_for(None).await?;
    info!(
        "Superbrain ready: {} documents merged, {} excluded.",
        context.included,
        context.excluded_for_failure + context.excluded_too_short + context.excluded_for_budget
    );

    // A machine-readable summary for whoever scripted this warm-up run.
    println!(
        "{}",
        serde_json::json!({
            "included": context.included,
            "excluded_for_failure": context.excluded_for_failure,
            "excluded_too_short": context.excluded_too_short,
            "excluded_for_budget": context.excluded_for_budget,
            "context_chars": context.text.chars().count(),
            "built_at": context.built_at.to_rfc3339(),
        })
    );

    Ok(())
}
