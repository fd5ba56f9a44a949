use tourapi_proxy::app::{build_app, init_tracing};
use tourapi_proxy::config::{Config, ProxyConfig};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    init_tracing();

    info!("Starting TourAPI proxy...");

    // Load configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid server configuration: {:#}", e);
            std::process::exit(1);
        }
    };
    info!("Configuration loaded: {:?}", config);

    let proxy_config = match ProxyConfig::from_env() {
        Ok(proxy_config) => proxy_config,
        Err(e) => {
            error!("Invalid proxy configuration: {:#}", e);
            std::process::exit(1);
        }
    };
    if proxy_config.service_key.is_none() {
        warn!("TOURAPI_KEY is not set; every proxy request will fail with 500");
    }
    info!("Proxy configuration loaded: {:?}", proxy_config);

    // Create the application
    let app = match build_app(proxy_config) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to create app: {}", e);
            std::process::exit(1);
        }
    };

    // Create TCP listener
    let listener = match tokio::net::TcpListener::bind(&config.bind_address()).await {
        Ok(listener) => {
            info!("Server running on {}", config.server_url());
            info!("Health check: GET /health");
            info!("Proxy endpoint: GET /api/tourapi");
            listener
        }
        Err(e) => {
            error!("Failed to bind to {}: {}", config.bind_address(), e);
            std::process::exit(1);
        }
    };

    // Start the server
    info!("Server starting...");
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
    } else {
        info!("Server shutdown gracefully");
    }
}
