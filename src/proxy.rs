use std::sync::Arc;

use axum::{
    Json,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::config::ProxyConfig;
use crate::error::{ProxyError, ProxyResult};
use crate::models::{InboundQuery, ModeParams};
use crate::upstream::{UpstreamClient, UpstreamReply, UpstreamRequest};

/// Turns one inbound query into one TourAPI call and maps the outcome.
#[derive(Clone)]
pub struct ProxyHandler {
    config: Arc<ProxyConfig>,
    upstream: Arc<dyn UpstreamClient>,
}

impl ProxyHandler {
    pub fn new(config: ProxyConfig, upstream: Arc<dyn UpstreamClient>) -> Self {
        Self {
            config: Arc::new(config),
            upstream,
        }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub async fn handle(&self, query: &InboundQuery) -> ProxyResult<Relay> {
        let mode = query.mode()?;

        let service_key = self.config.service_key.as_deref().ok_or_else(|| {
            ProxyError::MissingConfiguration("Missing TOURAPI_KEY".to_string())
        })?;

        let params = ModeParams::resolve(mode, query)?;
        debug!("Resolved {} params: {:?}", mode, params);

        let request = UpstreamRequest::build(&self.config, service_key, query.arrange(), &params);
        let reply = self.upstream.fetch(&request).await?;

        self.relay(reply)
    }

    fn relay(&self, reply: UpstreamReply) -> ProxyResult<Relay> {
        if !reply.is_success() {
            return Err(ProxyError::Upstream {
                status: reply.status,
                body: truncate_chars(&reply.body, self.config.error_body_limit),
            });
        }

        match serde_json::from_str::<Value>(&reply.body) {
            Ok(data) => {
                info!("Relaying JSON response from TourAPI");
                Ok(Relay::Json {
                    data,
                    cache_control: self.config.cache_control.clone(),
                })
            }
            Err(e) => {
                warn!("TourAPI returned a non-JSON body ({}), relaying raw text", e);
                Ok(Relay::Raw { text: reply.body })
            }
        }
    }
}

/// A successful upstream outcome, ready to be sent with status 200.
///
/// Only parsed JSON is marked cacheable; non-JSON bodies are usually
/// TourAPI error envelopes.
#[derive(Debug, Clone, PartialEq)]
pub enum Relay {
    Json { data: Value, cache_control: String },
    Raw { text: String },
}

impl Relay {
    pub fn body(&self) -> Value {
        match self {
            Relay::Json { data, .. } => data.clone(),
            Relay::Raw { text } => json!({ "raw": text }),
        }
    }
}

impl IntoResponse for Relay {
    fn into_response(self) -> Response {
        let mut response = Json(self.body()).into_response();

        if let Relay::Json { cache_control, .. } = &self {
            match HeaderValue::from_str(cache_control) {
                Ok(value) => {
                    response.headers_mut().insert(header::CACHE_CONTROL, value);
                }
                Err(_) => warn!("Ignoring invalid Cache-Control value: {}", cache_control),
            }
        }
        response
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
