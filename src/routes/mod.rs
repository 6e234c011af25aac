pub mod admin;
pub mod auth;

use axum::Router;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use serde::Deserialize;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/request-reset", post(auth::request_reset))
        .route("/reset-password", post(auth::reset_password))
        .route("/check-token/{email}/{token}", get(auth::check_token))
        .route("/debug/tokens", get(auth::debug_tokens))
        // Admin
        .route("/admin/users", get(admin::list_users))
        .route("/admin/docs", get(admin::docs))
        // Logs
        .route("/logs", get(logs))
}

#[derive(Deserialize)]
struct LogsQuery {
    limit: Option<String>,
}

const DEFAULT_LOG_LINES: usize = 200;

/// Tail of the app log as text/plain for the log viewer. A missing or
/// non-positive limit falls back to the default.
async fn logs(State(state): State<SharedState>, Query(query): Query<LogsQuery>) -> String {
    let limit = query
        .limit
        .and_then(|raw| raw.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_LOG_LINES);
    state.logbook.tail(limit).await
}
