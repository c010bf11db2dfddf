pub mod auth;
pub mod dispatcher;
pub mod handlers;
pub mod health;
pub mod panel;
pub mod server;

pub use dispatcher::ActionDispatcher;
pub use health::HealthReporter;
pub use server::{build_router, start, AppState, ServerConfig, ServerHandle};
