use axum::Json;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::AppError;
use crate::state::SharedState;
use crate::store::User;

/// Weak admin check: any client claiming admin via the `X-Admin` header or
/// the `admin` query parameter is believed. No session, no password re-check.
pub struct AdminGate;

fn flag_is_set(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true")
}

impl FromRequestParts<SharedState> for AdminGate {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(header) = parts.headers.get("x-admin") {
            if header.to_str().map(flag_is_set).unwrap_or(false) {
                return Ok(AdminGate);
            }
        }

        if let Some(query) = parts.uri.query() {
            for (key, value) in form_urlencoded::parse(query.as_bytes()) {
                if key == "admin" && flag_is_set(&value) {
                    return Ok(AdminGate);
                }
            }
        }

        Err(AppError::Unauthorized("admin required".to_string()))
    }
}

#[derive(Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

/// Full user listing, stored hashes included.
pub async fn list_users(
    _gate: AdminGate,
    State(state): State<SharedState>,
) -> Result<Json<UsersResponse>, AppError> {
    let users = state.store.read_all().await?;
    Ok(Json(UsersResponse { users }))
}

/// Static API documentation blob for the admin panel.
pub async fn docs(_gate: AdminGate) -> Json<Value> {
    Json(json!({
        "name": "Vuln Login API",
        "baseUrl": "/",
        "endpoints": [
            { "method": "GET", "path": "/health", "body": null, "notes": "API health check" },
            { "method": "POST", "path": "/register", "body": { "email": "string", "password": "string" } },
            { "method": "POST", "path": "/login", "body": { "email": "string", "password": "string" } },
            { "method": "POST", "path": "/request-reset", "body": { "email": "string" } },
            { "method": "POST", "path": "/reset-password", "body": { "email": "string", "token": "string", "newPassword": "string" } },
            { "method": "GET", "path": "/check-token/{email}/{token}", "body": null },
            { "method": "GET", "path": "/debug/tokens", "body": null, "notes": "Lists live reset tokens in plaintext" },
            { "method": "GET", "path": "/logs?limit=200", "body": null, "notes": "Tail of logs as text/plain" },
            { "method": "GET", "path": "/admin/users", "body": null, "auth": "X-Admin: 1" },
            { "method": "GET", "path": "/admin/docs", "body": null, "auth": "X-Admin: 1" },
        ],
    }))
}
