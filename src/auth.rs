// ABOUTME: Bearer token authentication for coach turns
// ABOUTME: AuthProvider seam plus an HS256 JWT implementation resolving the `sub` claim
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Authentication
//!
//! Every turn is authenticated before orchestration starts. The resolved
//! subject keys rate limiting and tool state.

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    /// Stable subject identifier
    pub subject: String,
}

/// Authentication seam
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve the caller from request headers
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` without credentials and `AuthInvalid` for bad ones
    async fn authenticate(&self, headers: &HeaderMap) -> AppResult<AuthResult>;
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject
    pub sub: String,
    /// Expiry, seconds since the epoch
    pub exp: i64,
    /// Issued at
    #[serde(default)]
    pub iat: i64,
}

/// HS256 bearer token verification
#[derive(Clone)]
pub struct JwtAuth {
    decoding_key: DecodingKey,
    encoding_key: EncodingKey,
}

impl JwtAuth {
    /// Create a verifier for `secret`
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for `subject` valid for `ttl`
    ///
    /// # Errors
    ///
    /// Returns an internal error if signing fails
    pub fn issue_token(&self, subject: &str, ttl: chrono::Duration) -> AppResult<String> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: subject.to_owned(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))
    }

    /// Verify `token` and return its subject
    ///
    /// # Errors
    ///
    /// Returns `AuthInvalid` for expired, malformed, or mis-signed tokens
    pub fn validate_token(&self, token: &str) -> AppResult<AuthResult> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::ExpiredSignature => "Token expired",
                ErrorKind::InvalidSignature => "Token signature is invalid",
                _ => "Token is malformed",
            };
            AppError::auth_invalid(reason)
        })?;

        if data.claims.sub.trim().is_empty() {
            return Err(AppError::auth_invalid("Token has no subject"));
        }
        Ok(AuthResult {
            subject: data.claims.sub,
        })
    }
}

impl std::fmt::Debug for JwtAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuth").finish_non_exhaustive()
    }
}

#[async_trait]
impl AuthProvider for JwtAuth {
    async fn authenticate(&self, headers: &HeaderMap) -> AppResult<AuthResult> {
        let token = bearer_token(headers)?;
        self.validate_token(token)
    }
}

/// Extract the bearer token from `Authorization`
///
/// # Errors
///
/// Returns `AuthRequired` when the header is absent and `AuthInvalid` when it
/// is not a bearer credential
pub fn bearer_token(headers: &HeaderMap) -> AppResult<&str> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(AppError::auth_required)?
        .to_str()
        .map_err(|_| AppError::auth_invalid("Authorization header is not valid UTF-8"))?;

    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::auth_invalid("Expected a Bearer token"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use axum::http::HeaderValue;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[tokio::test]
    async fn test_round_trip() {
        let auth = JwtAuth::new("secret");
        let token = auth.issue_token("athlete-1", chrono::Duration::hours(1)).unwrap();
        let result = auth
            .authenticate(&headers_with(&format!("Bearer {token}")))
            .await
            .unwrap();
        assert_eq!(result.subject, "athlete-1");
    }

    #[tokio::test]
    async fn test_rejections() {
        let auth = JwtAuth::new("secret");
        let err = auth.authenticate(&HeaderMap::new()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthRequired);

        let err = auth.authenticate(&headers_with("Basic abc")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthInvalid);

        let other = JwtAuth::new("other").issue_token("x", chrono::Duration::hours(1)).unwrap();
        let err = auth
            .authenticate(&headers_with(&format!("Bearer {other}")))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthInvalid);

        let expired = auth.issue_token("x", chrono::Duration::hours(-2)).unwrap();
        let err = auth.validate_token(&expired).unwrap_err();
        assert_eq!(err.message, "Token expired");
    }
}
