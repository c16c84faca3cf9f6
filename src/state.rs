use std::sync::Arc;

use crate::auth::CredentialStore;
use crate::config::Settings;
use crate::rate_limit::RateLimiter;
use crate::token::{TokenIssuer, TokenValidator};

// app's shared state, read-only apart from the limiter's counter map
pub struct AppState {
    pub limiter: RateLimiter,
    pub issuer: TokenIssuer,
    pub validator: TokenValidator,
    pub credentials: Arc<dyn CredentialStore>,
}

impl AppState {
    pub fn new(settings: &Settings, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            limiter: RateLimiter::new(settings.limiter),
            issuer: TokenIssuer::new(&settings.secret, settings.token_ttl),
            validator: TokenValidator::new(&settings.secret),
            credentials,
        }
    }
}
