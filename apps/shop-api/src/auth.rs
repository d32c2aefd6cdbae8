//! JWT authentication module.
//!
//! Handles token issuance and validation, and resolves the optional
//! customer identity of a request.
//!
//! ## Identity Resolution
//! ```text
//! Authorization header
//!      │
//!      ├── absent / not "Bearer" ─────────────► anonymous (guest)
//!      │
//!      ├── Bearer <invalid | expired> ────────► 401
//!      │
//!      └── Bearer <valid>
//!               │
//!               ├── user exists ──────────────► MaybeUser(Some(user))
//!               └── user deleted ─────────────► anonymous (guest)
//! ```

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use shop_db::UserRecord;
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Failed to issue token: {0}")]
    TokenIssue(String),
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// The user id carried in `sub`.
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// JWT token manager (HS256).
#[derive(Clone)]
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    /// Create a new JWT manager.
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            lifetime_secs,
        }
    }

    /// Issue a token for a user.
    pub fn issue(&self, user_id: i64) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenIssue(e.to_string()))
    }

    /// Validate and decode a token. Expiry is enforced.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            AuthError::InvalidToken
        })?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
///
/// The scheme is matched case-insensitively. Returns `None` for other
/// schemes or an empty token.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    let (scheme, token) = auth_header.trim().split_once(' ')?;
    let token = token.trim();

    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

// =============================================================================
// Extractor
// =============================================================================

/// The logged-in customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub name: String,
}

impl From<UserRecord> for CurrentUser {
    fn from(record: UserRecord) -> Self {
        CurrentUser {
            id: record.id,
            email: record.email,
            name: record.name,
        }
    }
}

/// Extractor for the optional customer identity.
///
/// Never rejects anonymous requests; only a bearer token that fails
/// validation is rejected (401).
///
/// ```rust,ignore
/// async fn handler(MaybeUser(user): MaybeUser) -> impl IntoResponse {
///     match user {
///         Some(u) => format!("Hello, {}!", u.name),
///         None => "Hello, guest!".to_string(),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn user_id(&self) -> Option<i64> {
        self.0.as_ref().map(|u| u.id)
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = match parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token)
        {
            Some(token) => token,
            None => return Ok(MaybeUser(None)),
        };

        let claims = state.jwt.validate(token)?;
        let user_id = claims.user_id().ok_or(AuthError::InvalidToken)?;

        let user = state.db.users().get_by_id(user_id).await?;
        if user.is_none() {
            debug!(user_id, "Token subject no longer exists, treating as guest");
        }

        Ok(MaybeUser(user.map(CurrentUser::from)))
    }
}
