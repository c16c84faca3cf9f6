use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::metrics::TOKENS_ISSUED;
use crate::models::{LoginRequest, TokenResponse};
use crate::state::AppState;

pub async fn token_handler(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<LoginRequest>,
) -> Response {
    let Some(subject) = state
        .credentials
        .authenticate(&credentials.email, &credentials.password)
    else {
        warn!(email = %credentials.email, "login rejected");
        let body = serde_json::json!({
            "code": "INVALID_CREDENTIALS",
            "message": "Invalid credentials",
        });
        return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    };

    match state.issuer.issue(subject) {
        Ok(token) => {
            TOKENS_ISSUED.inc();
            info!(subject, "issued token");
            Json(TokenResponse {
                token,
                expires_in: state.issuer.ttl().as_secs(),
            })
            .into_response()
        }
        Err(e) => e.into_response(),
    }
}
