//! HEXFRONT Server - HTTP API for the browser view
//!
//! This crate provides the web backend:
//! - REST API forwarding clicks, end-phase and move completion to the engine
//! - Board, supply and rules-table queries
//! - Static file serving for the view

mod routes;
mod state;

use axum::{
    routing::{get, post},
    Router,
};
use hexfront_core::Scenario;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

pub use state::ServerState;

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: String,
    /// Scenario loaded at startup
    pub scenario: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8003,
            static_dir: "web".to_string(),
            scenario: None,
        }
    }
}

/// Create the router with all routes
pub fn create_router(config: &ServerConfig, state: Arc<ServerState>) -> Router {
    let static_service = ServeDir::new(&config.static_dir);

    Router::new()
        // Status endpoint
        .route("/api/status", get(routes::status::status_handler))
        // Board and tables
        .route("/api/board", get(routes::board::get_board))
        .route("/api/rules", get(routes::board::get_rules))
        // Game API
        .route("/api/game/state", get(routes::game::get_game_state))
        .route("/api/game/load", post(routes::game::load_scenario))
        .route("/api/game/scenario", get(routes::game::export_scenario))
        .route("/api/game/hex-click", post(routes::game::hex_click))
        .route("/api/game/unit-click", post(routes::game::unit_click))
        .route("/api/game/end-phase", post(routes::game::end_phase))
        .route("/api/game/move-complete", post(routes::game::complete_move))
        .route("/api/game/supply", get(routes::game::get_supply))
        // Shared state
        .with_state(state)
        // The view may be served from another origin during development
        .layer(CorsLayer::permissive())
        // Static file serving (must be last)
        .fallback_service(static_service)
}

/// Start the HTTP server
pub async fn run_server(config: ServerConfig, state: ServerState) -> anyhow::Result<()> {
    if let Some(path) = &config.scenario {
        let scenario = Scenario::load(path)?;
        state.start_game(scenario);
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let router = create_router(&config, Arc::new(state));

    tracing::info!("HEXFRONT Server starting on http://0.0.0.0:{}", config.port);
    tracing::info!("Static files served from: {}", config.static_dir);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
