pub mod config;
pub mod error;
pub mod hash;
pub mod logbook;
pub mod routes;
pub mod state;
pub mod store;
pub mod token;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::logbook::Logbook;
use crate::state::{AppState, SharedState};
use crate::store::FileUserStore;
use crate::token::ResetTokenStore;

pub fn build_state(config: Config) -> SharedState {
    Arc::new(AppState {
        store: FileUserStore::new(config.users_file()),
        tokens: ResetTokenStore::new(),
        logbook: Logbook::new(config.log_file()),
        config,
    })
}

pub fn build_app(state: SharedState) -> Router {
    // Insecure defaults on purpose: wide-open CORS, no rate limiting.
    Router::new()
        .merge(routes::api_routes())
        .route("/health", axum::routing::get(health))
        .fallback_service(ServeDir::new(&state.config.public_dir))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            logbook::random_logger,
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}
