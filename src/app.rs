use std::sync::Arc;

use axum::{Extension, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ProxyConfig;
use crate::proxy::ProxyHandler;
use crate::routes::create_routes;
use crate::upstream::HttpUpstream;

/// Initialize tracing and logging for the application
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tourapi_proxy=info,tower_http=debug,axum::rejection=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the proxy with the real HTTP upstream and wrap it in the router
pub fn build_app(config: ProxyConfig) -> Result<Router, anyhow::Error> {
    info!("Initializing TourAPI upstream client");
    let upstream = HttpUpstream::new()?;
    Ok(create_app(ProxyHandler::new(config, Arc::new(upstream))))
}

/// Create and configure the Axum application with all routes and middleware
pub fn create_app(proxy: ProxyHandler) -> Router {
    info!("Initializing application router");

    let cors_permissive = proxy.config().cors_permissive;
    let router = Router::new()
        .merge(create_routes())
        .layer(Extension(proxy))
        .layer(TraceLayer::new_for_http());

    if cors_permissive {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
