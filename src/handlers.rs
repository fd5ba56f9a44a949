use crate::error::{ProxyError, ProxyResult};
use crate::models::{HealthResponse, InboundQuery};
use crate::proxy::{ProxyHandler, Relay};
use axum::{
    Extension,
    extract::{Query, rejection::QueryRejection},
    http::StatusCode,
    response::Json as ResponseJson,
};
use tracing::{debug, info};

/// Health check handler
/// Returns the service status and health information
pub async fn health_check() -> ResponseJson<HealthResponse> {
    debug!("Health check endpoint called");
    ResponseJson(HealthResponse::ok())
}

/// TourAPI proxy handler
/// Validates the query, performs one upstream call and relays the result
pub async fn tourapi_handler(
    Extension(proxy): Extension<ProxyHandler>,
    query: Result<Query<InboundQuery>, QueryRejection>,
) -> ProxyResult<Relay> {
    let Query(query) =
        query.map_err(|rejection| ProxyError::InvalidParameter(rejection.body_text()))?;

    info!(
        "TourAPI proxy called with by={}",
        query.by.as_deref().unwrap_or("location")
    );

    proxy.handle(&query).await
}

/// Bare OPTIONS requests get an empty success. Real CORS pre-flights are
/// answered by the CORS layer before reaching this handler.
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        Router,
        body::Body,
        http::{Method, Request, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::app::create_app;
    use crate::config::ProxyConfig;
    use crate::upstream::{UpstreamClient, UpstreamReply, UpstreamRequest};

    use super::*;

    struct CannedUpstream {
        status: u16,
        body: String,
        urls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl UpstreamClient for CannedUpstream {
        async fn fetch(&self, request: &UpstreamRequest) -> ProxyResult<UpstreamReply> {
            self.urls.lock().unwrap().push(request.url());
            Ok(UpstreamReply {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    fn canned(status: u16, body: &str) -> Arc<CannedUpstream> {
        Arc::new(CannedUpstream {
            status,
            body: body.to_string(),
            urls: Mutex::new(Vec::new()),
        })
    }

    fn app(config: ProxyConfig, upstream: Arc<CannedUpstream>) -> Router {
        create_app(ProxyHandler::new(config, upstream))
    }

    fn keyed() -> ProxyConfig {
        ProxyConfig::default().with_service_key("KEY")
    }

    async fn send(
        app: Router,
        method: Method,
        uri: &str,
    ) -> (StatusCode, axum::http::HeaderMap, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, _, body) =
            send(app(keyed(), canned(200, "{}")), Method::GET, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_location_request_relays_json() {
        let upstream = canned(200, r#"{"response":{"items":[]}}"#);
        let (status, headers, body) = send(
            app(keyed(), upstream.clone()),
            Method::GET,
            "/api/tourapi?by=location&mapX=127.0&mapY=37.5",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "response": { "items": [] } }));
        assert_eq!(
            headers.get(header::CACHE_CONTROL).unwrap(),
            "s-maxage=60, stale-while-revalidate=300"
        );

        let urls = upstream.urls.lock().unwrap().clone();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].contains("serviceKey=KEY&"));
        assert!(urls[0].contains("&radius=5000&pageNo=1&numOfRows=30&contentTypeId=12"));
    }

    #[tokio::test]
    async fn test_missing_by_defaults_to_location() {
        let upstream = canned(200, "{}");
        let (status, _, _) = send(
            app(keyed(), upstream.clone()),
            Method::GET,
            "/api/tourapi?mapX=127.0&mapY=37.5",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(upstream.urls.lock().unwrap()[0].contains("/locationBasedList2?"));
    }

    #[tokio::test]
    async fn test_missing_coordinates_is_bad_request() {
        let (status, _, body) = send(
            app(keyed(), canned(200, "{}")),
            Method::GET,
            "/api/tourapi?by=location&mapX=127.0",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("mapY"));
    }

    #[tokio::test]
    async fn test_area_without_area_code() {
        let (status, _, body) = send(
            app(keyed(), canned(200, "{}")),
            Method::GET,
            "/api/tourapi?by=area",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Missing areaCode" }));
    }

    #[tokio::test]
    async fn test_area_request_uses_area_defaults() {
        let upstream = canned(200, "{}");
        let (status, _, _) = send(
            app(keyed(), upstream.clone()),
            Method::GET,
            "/api/tourapi?by=area&areaCode=1&sigunguCode=",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let url = upstream.urls.lock().unwrap()[0].clone();
        assert!(url.contains("/areaBasedList2?"));
        assert!(url.contains("&numOfRows=100"));
        assert!(!url.contains("sigunguCode"));
    }

    #[tokio::test]
    async fn test_invalid_mode() {
        let (status, _, body) = send(
            app(keyed(), canned(200, "{}")),
            Method::GET,
            "/api/tourapi?by=nearby",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("nearby"));
    }

    #[tokio::test]
    async fn test_missing_key_is_server_error() {
        let upstream = canned(200, "{}");
        let (status, _, body) = send(
            app(ProxyConfig::default(), upstream.clone()),
            Method::GET,
            "/api/tourapi?mapX=127.0&mapY=37.5",
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Missing TOURAPI_KEY" }));
        assert!(upstream.urls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upstream_status_is_relayed() {
        let (status, headers, body) = send(
            app(keyed(), canned(503, "Service Unavailable")),
            Method::GET,
            "/api/tourapi?mapX=127.0&mapY=37.5",
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body,
            json!({ "error": "Upstream error", "status": 503, "body": "Service Unavailable" })
        );
        assert!(headers.get(header::CACHE_CONTROL).is_none());
    }

    #[tokio::test]
    async fn test_non_json_success_is_wrapped() {
        let (status, headers, body) = send(
            app(keyed(), canned(200, "SERVICE_KEY_IS_NOT_REGISTERED_ERROR")),
            Method::GET,
            "/api/tourapi?mapX=127.0&mapY=37.5",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "raw": "SERVICE_KEY_IS_NOT_REGISTERED_ERROR" }));
        assert!(headers.get(header::CACHE_CONTROL).is_none());
    }

    #[tokio::test]
    async fn test_numeric_params_forwarded_as_written() {
        let upstream = canned(200, "{}");
        let (status, _, _) = send(
            app(keyed(), upstream.clone()),
            Method::GET,
            "/api/tourapi?mapX=127.0&mapY=37.5&pageNo=007&radius=%2B500",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let url = upstream.urls.lock().unwrap()[0].clone();
        assert!(url.contains("&pageNo=007&"));
        assert!(url.contains("&radius=%2B500&"));
    }

    #[tokio::test]
    async fn test_malformed_radius_is_bad_request() {
        let (status, _, body) = send(
            app(keyed(), canned(200, "{}")),
            Method::GET,
            "/api/tourapi?mapX=127.0&mapY=37.5&radius=abc",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("radius"));
    }

    #[tokio::test]
    async fn test_bare_options_is_empty_success() {
        let (status, _, body) = send(
            app(keyed(), canned(200, "{}")),
            Method::OPTIONS,
            "/api/tourapi",
        )
        .await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_permissive_cors_header() {
        let request = Request::builder()
            .uri("/api/tourapi?mapX=127.0&mapY=37.5")
            .header(header::ORIGIN, "https://example.com")
            .body(Body::empty())
            .unwrap();
        let response = app(keyed(), canned(200, "{}"))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_cors_disabled() {
        let mut config = keyed();
        config.cors_permissive = false;
        let request = Request::builder()
            .uri("/api/tourapi?mapX=127.0&mapY=37.5")
            .header(header::ORIGIN, "https://example.com")
            .body(Body::empty())
            .unwrap();
        let response = app(config, canned(200, "{}")).oneshot(request).await.unwrap();

        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }
}
