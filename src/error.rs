use std::fmt;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

/// Failure taxonomy of the proxy.
///
/// Every variant renders as a single JSON object with at least an `error`
/// field. A non-JSON success body from TourAPI is not an error; it is
/// relayed as a raw-text wrapper instead.
#[derive(Debug)]
pub enum ProxyError {
    /// Missing or malformed query parameter (400).
    InvalidParameter(String),
    /// Required process configuration is absent (500).
    MissingConfiguration(String),
    /// TourAPI answered with a non-success status; relayed as-is.
    Upstream { status: u16, body: String },
    /// Anything else, e.g. a transport failure (500).
    Internal(String),
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::InvalidParameter(msg) => write!(f, "Invalid parameter: {msg}"),
            ProxyError::MissingConfiguration(msg) => write!(f, "Missing configuration: {msg}"),
            ProxyError::Upstream { status, .. } => write!(f, "Upstream error: status {status}"),
            ProxyError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ProxyError {}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ProxyError::MissingConfiguration(_) | ProxyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            ProxyError::InvalidParameter(msg) => {
                warn!("Rejected request: {}", msg);
                json!({ "error": msg })
            }
            ProxyError::MissingConfiguration(msg) => {
                error!("Configuration error: {}", msg);
                json!({ "error": msg })
            }
            ProxyError::Upstream { status, body } => {
                warn!("Upstream returned status {}", status);
                json!({
                    "error": "Upstream error",
                    "status": status,
                    "body": body,
                })
            }
            ProxyError::Internal(msg) => {
                error!("Internal server error: {}", msg);
                json!({ "error": msg })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        ProxyError::Internal(err.to_string())
    }
}

/// Result type for proxy operations
pub type ProxyResult<T> = Result<T, ProxyError>;
