// Admission guards: rate limit on every /api route, auth inside it on protected ones

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::{AuthError, LimitError};
use crate::metrics::{REQUEST_LATENCY, REQUEST_TOTAL};
use crate::state::AppState;
use crate::token::SubjectId;

// Key used when the peer address was not recorded on the request
const UNKNOWN_CLIENT: &str = "unknown";

// Host part of the peer address, port stripped
pub fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

pub async fn rate_limit_guard(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, LimitError> {
    REQUEST_TOTAL.inc();
    let key = client_key(&request);

    if let Err(err) = state.limiter.admit(&key, Instant::now()) {
        warn!(client = %key, error = %err, "rate limit exceeded");
        return Err(err);
    }

    let start_time = Instant::now();
    let response = next.run(request).await;
    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

    Ok(response)
}

pub async fn auth_guard(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = match request.headers().get(AUTHORIZATION) {
        Some(value) => Some(value.to_str().map_err(|_| AuthError::Malformed)?),
        None => None,
    };

    let subject = state.validator.validate(header).inspect_err(|err| {
        debug!(reason = err.reason(), path = %request.uri().path(), "authentication failed");
    })?;

    request.extensions_mut().insert(Subject(subject));
    Ok(next.run(request).await)
}

// Verified subject, only set behind `auth_guard`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject(pub SubjectId);

impl<S> FromRequestParts<S> for Subject
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Subject>()
            .copied()
            .ok_or(AuthError::Missing)
    }
}
