// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use bson::oid::ObjectId;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user id, 24 hex chars)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: ObjectId,
}

/// Middleware that requires valid JWT authentication.
///
/// Accepts both `Authorization: Bearer <token>` and a bare token, since
/// frontend revisions send either form.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(token_from_header)
        .ok_or(AppError::Unauthorized)?
        .to_string();

    let user_id = verify_jwt(&token, &state.config.jwt_secret).map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        AppError::InvalidToken
    })?;

    request.extensions_mut().insert(AuthUser { user_id });

    Ok(next.run(request).await)
}

/// Pull the token out of an `Authorization` value; `None` when empty,
/// including a `Bearer` scheme with nothing after it.
fn token_from_header(value: &str) -> Option<&str> {
    let value = value.trim();
    let token = match value.strip_prefix("Bearer") {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => rest.trim(),
        _ => value,
    };
    (!token.is_empty()).then_some(token)
}

/// Decode a session token and return the user id it was issued for.
pub fn verify_jwt(token: &str, signing_key: &[u8]) -> anyhow::Result<ObjectId> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation)?;
    Ok(ObjectId::parse_str(&token_data.claims.sub)?)
}

/// Create a JWT for a user session.
pub fn create_jwt(user_id: ObjectId, signing_key: &[u8], ttl_hours: i64) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;
    let exp = usize::try_from(ttl_hours.max(0))?
        .checked_mul(60 * 60)
        .and_then(|ttl_secs| now.checked_add(ttl_secs))
        .ok_or_else(|| anyhow::anyhow!("Token lifetime of {} hours is too large", ttl_hours))?;

    let claims = Claims {
        sub: user_id.to_hex(),
        iat: now,
        exp,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
