//! HTTP surface: liveness, engine status, journal, and the Telegram webhook

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod types;

pub use handlers::AppState;
pub use routes::create_router;
pub use types::*;
