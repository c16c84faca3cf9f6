use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::metrics::{AUTH_FAILURES, RATE_LIMITED};

// Why a protected request was turned away before reaching its handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing authorization header")]
    Missing,
    #[error("authorization header must be `Bearer <token>`")]
    Malformed,
    #[error("token signature or structure is invalid")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

impl AuthError {
    // Short label used for logs and the auth-failure metric
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::Missing => "missing",
            AuthError::Malformed => "malformed",
            AuthError::BadSignature => "bad_signature",
            AuthError::Expired => "expired",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AUTH_FAILURES.with_label_values(&[self.reason()]).inc();

        let body = serde_json::json!({
            "code": "UNAUTHORIZED",
            "reason": self.reason(),
            "message": self.to_string(),
        });

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LimitError {
    #[error("rate limit of {limit} requests exceeded, retry in {retry_after}s")]
    Exceeded { limit: u32, retry_after: u64 },
}

impl IntoResponse for LimitError {
    fn into_response(self) -> Response {
        RATE_LIMITED.inc();

        let LimitError::Exceeded { limit, retry_after } = self;
        let body = serde_json::json!({
            "code": "RATE_LIMIT_EXCEEDED",
            "message": self.to_string(),
            "limit": limit,
        });

        let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(retry_after));
        response
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    // recoverable: caller falls back to the documented default
    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
    #[error("signing secret must not be empty")]
    MissingSecret,
    #[error("token ttl must be a positive number of seconds")]
    InvalidTtl,
    #[error("invalid seed user {0:?}, expected email:password:id")]
    InvalidUser(String),
}

#[derive(Debug, Error)]
#[error("failed to sign token: {0}")]
pub struct SigningError(#[from] pub jsonwebtoken::errors::Error);

impl IntoResponse for SigningError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "token signing failed");
        let body = serde_json::json!({
            "code": "INTERNAL_ERROR",
            "message": "Failed to generate token",
        });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
