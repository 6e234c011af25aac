use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::hash;
use crate::state::SharedState;
use crate::store::User;
use crate::token::{self, ActiveToken, CheckReason};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct RequestResetRequest {
    pub email: Option<String>,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    pub token: Option<String>,
    #[serde(rename = "newPassword")]
    pub new_password: Option<String>,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub email: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct RequestResetResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_token: Option<String>,
}

#[derive(Serialize)]
pub struct CheckTokenResponse {
    pub valid: bool,
    pub email: String,
    pub reason: CheckReason,
}

#[derive(Serialize)]
pub struct DebugTokensResponse {
    pub message: String,
    #[serde(rename = "activeTokens")]
    pub active_tokens: Vec<ActiveToken>,
    pub count: usize,
}

fn required(field: Option<String>, message: &str) -> Result<String, AppError> {
    match field {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(AppError::BadRequest(message.to_string())),
    }
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let email = required(req.email, "email and password are required")?;
    let password = required(req.password, "email and password are required")?;

    if state.store.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(
            "User with that email already exists".to_string(),
        ));
    }

    // No password strength validation, by design.
    let password_hash = hash::encode(&email, &password);
    state
        .store
        .append(User {
            email: email.clone(),
            password_hash,
        })
        .await?;

    tracing::info!("user registered: {email}");
    Ok((StatusCode::CREATED, Json(RegisterResponse { email })))
}

pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let email = required(req.email, "email and password are required")?;
    let password = required(req.password, "email and password are required")?;

    // Unknown email and wrong password answer identically.
    let Some(user) = state.store.find_by_email(&email).await? else {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    };

    if !hash::verify(&email, &password, &user.password_hash) {
        tracing::debug!("login failed for {email}: bad password");
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    Ok(Json(LoginResponse { success: true }))
}

pub async fn request_reset(
    State(state): State<SharedState>,
    Json(req): Json<RequestResetRequest>,
) -> Result<Json<RequestResetResponse>, AppError> {
    let email = required(req.email, "email is required")?;

    let now = Utc::now().timestamp();
    let token = if state.store.find_by_email(&email).await?.is_some() {
        let entry = state.tokens.issue_at(&email, now);
        state
            .logbook
            .append(&format!(
                "{} RESET_TOKEN email={} token={}",
                Utc::now().to_rfc3339(),
                email,
                entry.token
            ))
            .await;
        entry.token
    } else {
        // Computed but never stored: the response stays uniform while
        // check-token keeps reporting no_token_found for this email.
        let token = token::derive_token(&email, now);
        state
            .logbook
            .append(&format!(
                "{} RESET_TOKEN (unregistered) email={} token={}",
                Utc::now().to_rfc3339(),
                email,
                token
            ))
            .await;
        token
    };

    let debug_token = state.config.debug_tokens.then_some(token);
    Ok(Json(RequestResetResponse {
        message: "If that email exists, a reset link has been sent".to_string(),
        debug_token,
    }))
}

pub async fn reset_password(
    State(state): State<SharedState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let missing = "email, token and newPassword are required";
    let email = required(req.email, missing)?;
    let token = required(req.token, missing)?;
    let new_password = required(req.new_password, missing)?;

    let check = state.tokens.consume(&email, &token);
    if !check.valid {
        return Err(AppError::BadRequest("Invalid or expired token".to_string()));
    }

    let password_hash = hash::encode(&email, &new_password);
    let updated = state
        .store
        .update_password(&email, &password_hash)
        .await
        .map_err(|e| AppError::internal_with_trace(e.to_string()))?;
    if !updated {
        return Err(AppError::internal_with_trace("User not found"));
    }

    tracing::info!("password reset for {email}");
    Ok(Json(MessageResponse {
        message: "Password has been reset".to_string(),
    }))
}

pub async fn check_token(
    State(state): State<SharedState>,
    Path((email, token)): Path<(String, String)>,
) -> Json<CheckTokenResponse> {
    let check = state.tokens.check(&email, &token);
    Json(CheckTokenResponse {
        valid: check.valid,
        email,
        reason: check.reason,
    })
}

pub async fn debug_tokens(State(state): State<SharedState>) -> Json<DebugTokensResponse> {
    let active_tokens = state.tokens.snapshot();
    let count = active_tokens.len();
    Json(DebugTokensResponse {
        message: "DEBUG: live password reset tokens".to_string(),
        active_tokens,
        count,
    })
}
