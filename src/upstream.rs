use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tracing::{debug, info};

use crate::config::ProxyConfig;
use crate::error::ProxyResult;
use crate::models::ModeParams;

/// A fully assembled TourAPI GET request.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    endpoint: String,
    service_key: String,
    /// Everything after the `serviceKey` pair, already escaped.
    params: String,
}

impl UpstreamRequest {
    /// Builds the upstream URL for one inbound request.
    ///
    /// The service key is inserted as stored: keys issued by data.go.kr are
    /// usually distributed already percent-encoded and a second pass breaks
    /// authentication. Every other value is query-component escaped.
    pub fn build(
        config: &ProxyConfig,
        service_key: &str,
        arrange: Option<&str>,
        params: &ModeParams,
    ) -> Self {
        let endpoint = format!(
            "{}/{}/{}",
            config.base_url.trim_end_matches('/'),
            config.generation.service_path(),
            config.generation.resource(params.mode()),
        );

        let mut query = String::new();
        let fixed = [
            ("MobileOS", config.mobile_os.as_str()),
            ("MobileApp", config.mobile_app.as_str()),
            ("_type", "json"),
            ("arrange", arrange.unwrap_or(config.arrange.as_str())),
        ];
        for (key, value) in fixed {
            push_pair(&mut query, key, value);
        }
        for (key, value) in params.query_pairs() {
            push_pair(&mut query, key, &value);
        }

        Self {
            endpoint,
            service_key: service_key.to_string(),
            params: query,
        }
    }

    pub fn url(&self) -> String {
        self.with_key(&self.service_key)
    }

    /// The URL with the `serviceKey` value masked, for logging.
    pub fn redacted_url(&self) -> String {
        self.with_key("***API_KEY***")
    }

    fn with_key(&self, key: &str) -> String {
        format!("{}?serviceKey={}{}", self.endpoint, key, self.params)
    }
}

fn push_pair(query: &mut String, key: &str, value: &str) {
    query.push('&');
    query.push_str(&urlencoding::encode(key));
    query.push('=');
    query.push_str(&urlencoding::encode(value));
}

/// Status and body text of a TourAPI response, whatever its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: String,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs the single outbound call for a request.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn fetch(&self, request: &UpstreamRequest) -> ProxyResult<UpstreamReply>;
}

/// reqwest-backed [`UpstreamClient`]. The inner client is pooled and cheap
/// to clone.
#[derive(Clone, Default)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    async fn fetch(&self, request: &UpstreamRequest) -> ProxyResult<UpstreamReply> {
        info!("Calling TourAPI: {}", request.redacted_url());

        let response = self
            .client
            .get(request.url())
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await?;

        let status = response.status().as_u16();
        info!("Received response status: {}", status);

        let body = response.text().await?;
        debug!("Response body: {} bytes", body.len());

        Ok(UpstreamReply { status, body })
    }
}
