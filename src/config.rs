use std::env;

use anyhow::Context;

use crate::models::ApiGeneration;

pub const DEFAULT_BASE_URL: &str = "https://apis.data.go.kr/B551011";
pub const DEFAULT_CACHE_CONTROL: &str = "s-maxage=60, stale-while-revalidate=300";

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Upstream and response policy for the TourAPI proxy.
///
/// Built once at startup and shared read-only by every request. The
/// credential is optional here: a missing key is reported per request
/// rather than refusing to start.
#[derive(Clone)]
pub struct ProxyConfig {
    pub base_url: String,
    pub generation: ApiGeneration,
    pub mobile_os: String,
    pub mobile_app: String,
    pub arrange: String,
    /// Inserted into the upstream URL exactly as stored, never re-encoded.
    pub service_key: Option<String>,
    pub cache_control: String,
    pub error_body_limit: usize,
    pub cors_permissive: bool,
}

impl ProxyConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; unset names keep their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let generation = match lookup("TOURAPI_GENERATION") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("TOURAPI_GENERATION has invalid value '{raw}'"))?,
            None => defaults.generation,
        };

        let error_body_limit = match lookup("TOURAPI_ERROR_BODY_LIMIT") {
            Some(raw) => raw
                .parse()
                .context("TOURAPI_ERROR_BODY_LIMIT must be a valid number")?,
            None => defaults.error_body_limit,
        };

        let cors_permissive = match lookup("CORS_PERMISSIVE") {
            Some(raw) => parse_flag(&raw)
                .with_context(|| format!("CORS_PERMISSIVE has invalid value '{raw}'"))?,
            None => defaults.cors_permissive,
        };

        Ok(Self {
            base_url: lookup("TOURAPI_BASE_URL").unwrap_or(defaults.base_url),
            generation,
            mobile_os: defaults.mobile_os,
            mobile_app: lookup("TOURAPI_APP_NAME").unwrap_or(defaults.mobile_app),
            arrange: lookup("TOURAPI_ARRANGE").unwrap_or(defaults.arrange),
            service_key: lookup("TOURAPI_KEY").filter(|key| !key.is_empty()),
            cache_control: lookup("TOURAPI_CACHE_CONTROL").unwrap_or(defaults.cache_control),
            error_body_limit,
            cors_permissive,
        })
    }

    pub fn with_service_key(mut self, key: impl Into<String>) -> Self {
        self.service_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            generation: ApiGeneration::default(),
            mobile_os: "ETC".to_string(),
            mobile_app: "TrendTrip".to_string(),
            arrange: "E".to_string(),
            service_key: None,
            cache_control: DEFAULT_CACHE_CONTROL.to_string(),
            error_body_limit: 2000,
            cors_permissive: true,
        }
    }
}

// The key must never end up in logs.
impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("base_url", &self.base_url)
            .field("generation", &self.generation)
            .field("mobile_os", &self.mobile_os)
            .field("mobile_app", &self.mobile_app)
            .field("arrange", &self.arrange)
            .field("service_key", &self.service_key.as_ref().map(|_| "***"))
            .field("cache_control", &self.cache_control)
            .field("error_body_limit", &self.error_body_limit)
            .field("cors_permissive", &self.cors_permissive)
            .finish()
    }
}

fn parse_flag(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow::anyhow!("expected a boolean, got '{other}'")),
    }
}
