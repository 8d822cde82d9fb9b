use alloy::signers::local::PrivateKeySigner;
use std::time::Duration;
use url::Url;
use weatherpay::{
    DEFAULT_ASSERTION_MAX_AGE_SECS, DEFAULT_BASE_URL, DEFAULT_PAYMENT_SERVICE_URL,
};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_WEATHER_API_URL: &str = "https://openweathermap.org/data/2.5/weather";
const DEFAULT_WEATHER_CITY_ID: &str = "5746545";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

/// Where and how to fetch the upstream weather report.
#[derive(Clone)]
pub struct UpstreamConfig {
    pub api_url: String,
    pub city_id: String,
    /// Provider API key (None = no `appid` parameter)
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("api_url", &self.api_url)
            .field("city_id", &self.city_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_WEATHER_API_URL.to_string(),
            city_id: DEFAULT_WEATHER_CITY_ID.to_string(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
        }
    }
}

impl UpstreamConfig {
    /// Full request URL including the city and (optional) key parameters.
    pub fn request_url(&self) -> Result<Url, ConfigError> {
        let mut url =
            Url::parse(&self.api_url).map_err(|_| ConfigError::InvalidUrl(self.api_url.clone()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("id", &self.city_id);
            if let Some(ref key) = self.api_key {
                query.append_pair("appid", key);
            }
        }
        Ok(url)
    }
}

#[derive(Clone)]
pub struct ServerConfig {
    /// Server identity key, used by the identity and payment layers
    pub server_key: PrivateKeySigner,
    /// Public base URL the server is reached at; identity assertions are bound to it
    pub base_url: String,
    pub port: u16,
    /// Settlement service the payment gate calls
    pub payment_service_url: String,
    pub upstream: UpstreamConfig,
    /// Accepted clock skew / age for identity assertions
    pub assertion_max_age_secs: i64,
    /// Bearer token required for /metrics (None = public)
    pub metrics_token: Option<String>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("server_key", &"[REDACTED]")
            .field("server_address", &self.server_key.address())
            .field("base_url", &self.base_url)
            .field("port", &self.port)
            .field("payment_service_url", &self.payment_service_url)
            .field("upstream", &self.upstream)
            .field("assertion_max_age_secs", &self.assertion_max_age_secs)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl ServerConfig {
    /// Defaults for everything except the server key.
    pub fn new(server_key: PrivateKeySigner) -> Self {
        Self {
            server_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            port: DEFAULT_PORT,
            payment_service_url: DEFAULT_PAYMENT_SERVICE_URL.to_string(),
            upstream: UpstreamConfig::default(),
            assertion_max_age_secs: DEFAULT_ASSERTION_MAX_AGE_SECS,
            metrics_token: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        // Required: server private key
        let raw_key =
            var("SERVER_PRIVATE_KEY").ok_or(ConfigError::MissingRequired("SERVER_PRIVATE_KEY"))?;
        let server_key: PrivateKeySigner = raw_key
            .parse()
            .map_err(|_| ConfigError::InvalidKey("SERVER_PRIVATE_KEY"))?;

        let base_url = var("HOSTING_DOMAIN").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Url::parse(&base_url).map_err(|_| ConfigError::InvalidUrl(base_url.clone()))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let port = match var("PORT") {
            Some(p) => p.parse().map_err(|_| ConfigError::InvalidNumber("PORT", p))?,
            None => DEFAULT_PORT,
        };

        let payment_service_url = var("PAYMENT_SERVICE_URL")
            .unwrap_or_else(|| DEFAULT_PAYMENT_SERVICE_URL.to_string());
        Url::parse(&payment_service_url)
            .map_err(|_| ConfigError::InvalidUrl(payment_service_url.clone()))?;

        let timeout_secs = match var("UPSTREAM_TIMEOUT_SECS") {
            Some(t) => t
                .parse()
                .map_err(|_| ConfigError::InvalidNumber("UPSTREAM_TIMEOUT_SECS", t))?,
            None => DEFAULT_UPSTREAM_TIMEOUT_SECS,
        };

        let upstream = UpstreamConfig {
            api_url: var("WEATHER_API_URL").unwrap_or_else(|| DEFAULT_WEATHER_API_URL.to_string()),
            city_id: var("WEATHER_CITY_ID").unwrap_or_else(|| DEFAULT_WEATHER_CITY_ID.to_string()),
            api_key: var("WEATHER_API_KEY"),
            timeout: Duration::from_secs(timeout_secs),
        };
        upstream.request_url()?;

        let assertion_max_age_secs = match var("ASSERTION_MAX_AGE_SECS") {
            Some(a) => match a.parse::<i64>() {
                Ok(secs) if secs > 0 => secs,
                _ => return Err(ConfigError::InvalidNumber("ASSERTION_MAX_AGE_SECS", a)),
            },
            None => DEFAULT_ASSERTION_MAX_AGE_SECS,
        };

        let metrics_token = var("METRICS_TOKEN");
        if metrics_token.is_none() {
            tracing::warn!("METRICS_TOKEN not set; /metrics endpoint is publicly accessible");
        }
        if upstream.api_key.is_none() {
            tracing::warn!("WEATHER_API_KEY not set; upstream requests carry no appid");
        }

        Ok(Self {
            server_key,
            base_url,
            port,
            payment_service_url: payment_service_url.trim_end_matches('/').to_string(),
            upstream,
            assertion_max_age_secs,
            metrics_token,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid private key in {0}")]
    InvalidKey(&'static str),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid number in {0}: {1}")]
    InvalidNumber(&'static str, String),
}
