//! Session tokens issued by the identity provider.
//!
//! The provider signs HS256 tokens with a secret shared with this server.
//! Nothing here checks credentials: we only verify a token, and re-sign it
//! with a later expiry while it is still valid.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use quorum_models::user::CurrentUser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::AppConfig;

/// Cookie carrying the access token between browser and server.
pub const SESSION_COOKIE: &str = "quorum-access-token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user(&self) -> CurrentUser {
        CurrentUser {
            id: self.sub.clone(),
            email: self.email.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("session expired")]
    Expired,
    #[error("invalid session token")]
    Invalid,
    #[error("failed to sign session token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

pub fn create_token(
    user: &CurrentUser,
    secret: &str,
    expiry_seconds: u64,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let iat = now.timestamp();
    let claims = Claims {
        sub: user.id.clone(),
        email: user.email.clone(),
        iat,
        exp: iat.saturating_add(i64::try_from(expiry_seconds).unwrap_or(i64::MAX)),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(AuthError::Signing)
}

pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::default();
    validation.leeway = 0;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        _ => AuthError::Invalid,
    })?;
    if data.claims.sub.trim().is_empty() {
        return Err(AuthError::Invalid);
    }
    Ok(data.claims)
}

/// What the response should do with the session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRefresh {
    /// Leave the cookie alone.
    Unchanged,
    /// Replace the cookie with this freshly signed token.
    Renewed(String),
    /// The cookie holds an expired or forged token; remove it.
    Cleared,
}

/// Decides how to refresh the session carried by `token`.
///
/// A token is renewed once fewer than `refresh_threshold_seconds` remain
/// before it expires.
pub fn refresh_session(
    token: Option<&str>,
    config: &AppConfig,
    now: DateTime<Utc>,
) -> Result<SessionRefresh, AuthError> {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return Ok(SessionRefresh::Unchanged);
    };

    let claims = match validate_token(token, &config.jwt_secret) {
        Ok(claims) => claims,
        Err(AuthError::Expired | AuthError::Invalid) => return Ok(SessionRefresh::Cleared),
        Err(e) => return Err(e),
    };

    let remaining = claims.exp.saturating_sub(now.timestamp());
    let threshold = i64::try_from(config.refresh_threshold_seconds).unwrap_or(i64::MAX);
    if remaining >= threshold {
        return Ok(SessionRefresh::Unchanged);
    }

    let token = create_token(&claims.user(), &config.jwt_secret, config.jwt_expiry_seconds, now)?;
    Ok(SessionRefresh::Renewed(token))
}
