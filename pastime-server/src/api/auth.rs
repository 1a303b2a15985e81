use axum::{extract::State, http::HeaderMap, Json};

use super::{ApiError, ApiResult};
use crate::db::repositories::{is_unique_violation, UserRepository};
use crate::middleware::session_token;
use crate::password::{hash_password, verify_password};
use crate::state::AppState;
use pastime_types::{AuthResponse, LoginRequest, RegisterRequest};

const IDENTITY_TAKEN: &str = "Email or username already in use.";

fn all_present(fields: &[&str]) -> bool {
    fields.iter().all(|field| !field.trim().is_empty())
}

/// Run argon2 work on the blocking pool
async fn off_runtime<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::InternalError(format!("Credential task failed: {}", e)))
}

/// POST /register - Create an account and log it in
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    if !all_present(&[
        &payload.username,
        &payload.first_name,
        &payload.last_name,
        &payload.email,
        &payload.password,
        &payload.city,
        &payload.state,
    ]) {
        return Err(ApiError::BadRequest("All fields are required.".to_string()));
    }

    let repo = UserRepository::new(state.db.pool.clone());
    if repo.email_or_username_taken(&payload.email, &payload.username)? {
        return Err(ApiError::BadRequest(IDENTITY_TAKEN.to_string()));
    }

    let password = payload.password.clone();
    let password_hash = off_runtime(move || hash_password(&password)).await??;

    // A concurrent registration can claim the email or username after the check above
    let user = repo.create(&payload, &password_hash).map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::BadRequest(IDENTITY_TAKEN.to_string())
        } else {
            ApiError::from(e)
        }
    })?;
    let session_token = state.session_manager.create_session(user.id, &user.email)?;

    tracing::info!("Registered user {} ({})", user.username, user.id);
    Ok(Json(AuthResponse {
        user,
        session_token,
    }))
}

/// POST /login - Exchange email and password for a session token
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let repo = UserRepository::new(state.db.pool.clone());
    let invalid = || ApiError::Unauthorized("Invalid login".to_string());

    let (user, stored_hash) = repo
        .get_with_credential(payload.email.trim())?
        .ok_or_else(invalid)?;

    let password = payload.password;
    let verified = off_runtime(move || verify_password(&password, &stored_hash)).await?;
    if !verified {
        tracing::debug!("Password mismatch for {}", user.id);
        return Err(invalid());
    }

    let session_token = state.session_manager.create_session(user.id, &user.email)?;
    Ok(Json(AuthResponse {
        user,
        session_token,
    }))
}

/// POST /logout - End the session named by the request header
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    if let Some(token) = session_token(&headers) {
        state.session_manager.delete_session(token)?;
    }

    Ok(Json(serde_json::json!({
        "message": "Logged out successfully"
    })))
}
