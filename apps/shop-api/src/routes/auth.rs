//! Account endpoints.
//!
//! - `POST /api/auth/register` - create an account, returns a token
//! - `POST /api/auth/login` - exchange credentials for a token

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use shop_core::validation::{validate_display_name, validate_password};
use shop_core::Email;
use shop_db::password::{hash_password, verify_password};
use shop_db::DbError;
use tracing::info;
use ts_rs::TS;

use crate::auth::AuthError;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Issued bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TokenResponse {
    pub token: String,
    /// Always `"bearer"`
    pub token_type: String,
}

impl TokenResponse {
    fn bearer(token: String) -> Self {
        TokenResponse {
            token,
            token_type: "bearer".to_string(),
        }
    }
}

/// `POST /api/auth/register`
///
/// An already registered email is a 400; the UNIQUE index on `users.email`
/// decides when two registrations race.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Json(body) = payload?;

    let email = Email::parse(&body.email)?;
    validate_password(&body.password)?;
    let name = validate_display_name(&body.name)?;

    let password = body.password;
    let hash = run_blocking(move || hash_password(&password)).await??;
    let user = state
        .db
        .users()
        .create(&email, &hash, &name)
        .await
        .map_err(|err| match err {
            DbError::UniqueViolation { .. } => ApiError::already_exists("Email already registered"),
            other => other.into(),
        })?;
    info!(user_id = user.id, "User registered");

    let token = state.jwt.issue(user.id)?;
    Ok(Json(TokenResponse::bearer(token)))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<TokenResponse>> {
    let Json(body) = payload?;
    let email = Email::parse(&body.email)?;

    let user = state
        .db
        .users()
        .find_by_email(&email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let password = body.password;
    let stored_hash = user.password_hash.clone();
    let verified = run_blocking(move || verify_password(&password, &stored_hash)).await?;
    if !verified {
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.jwt.issue(user.id)?;
    Ok(Json(TokenResponse::bearer(token)))
}

/// Runs Argon2 work on the blocking pool.
async fn run_blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!("Password task failed: {}", e);
        ApiError::internal("Password check failed")
    })
}
