//! Main Entrypoint for the Amadeus Bridge Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Loading the provider registry and the system prompt.
//! 4. Constructing the Axum router and applying middleware.
//! 5. Starting the web server and handling graceful shutdown.

use amadeus_api::{
    config::{BridgeMode, Config},
    router::create_router,
    state::AppState,
};
use amadeus_core::{HttpLlmGateway, LlmGateway, ProviderRegistry, prompt::load_system_prompt};
use anyhow::Context;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Load Provider Registry and Prompt ---
    // Direct mode never calls an LLM, so a missing registry only warns there.
    let registry = match ProviderRegistry::from_path(&config.providers_path) {
        Ok(registry) => registry,
        Err(err) if config.mode == BridgeMode::Direct => {
            warn!(%err, "Provider registry unavailable; continuing in direct mode");
            ProviderRegistry::default()
        }
        Err(err) => {
            return Err(err).context("Failed to load provider registry (required in AI mode)");
        }
    };
    let system_prompt = load_system_prompt(&config.prompt_path);

    // --- 4. Build Shared State ---
    let gateway: Arc<dyn LlmGateway> = Arc::new(HttpLlmGateway::new(
        registry.clone(),
        config.llm_provider.clone(),
        system_prompt,
        config.llm_timeout,
    ));
    let app_state = Arc::new(AppState {
        config: Arc::new(config.clone()),
        registry,
        gateway,
    });

    // --- 5. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = create_router(app_state).layer(cors);

    // --- 6. Start Server ---
    info!(
        mode = ?config.mode,
        provider = %config.llm_provider,
        robot = %config.robot_ws_url,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server has shut down.");
    Ok(())
}
