pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod proxy;
pub mod routes;
pub mod upstream;

// Re-export key functions for convenience
pub use app::{build_app, create_app, init_tracing};
pub use proxy::ProxyHandler;
