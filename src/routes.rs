use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

use crate::handlers::{health_handler, me_handler, metrics_handler, token_handler};
use crate::middleware::{auth_guard, rate_limit_guard};
use crate::state::AppState;

// Rate limiting is the outer layer on /api, auth only wraps protected routes
pub fn app(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/me", get(me_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let api = Router::new()
        .route("/auth/token", post(token_handler))
        .merge(protected)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_guard));

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .nest("/api", api)
        .with_state(state)
}
