mod health;
mod metrics;
mod session;
mod token;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use session::me_handler;
pub use token::token_handler;
