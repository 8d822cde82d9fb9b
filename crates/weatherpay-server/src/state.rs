use std::sync::Arc;
use weatherpay::{IdentityVerifier, PaymentGate, PricePolicy};

use crate::config::{ConfigError, ServerConfig};
use crate::identity::SignedAssertionVerifier;
use crate::payment::SettlementPaymentGate;
use crate::upstream::{HttpWeatherSource, WeatherSource};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Shared application state. Immutable once built; every request gets its
/// own identity and payment context.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub prices: Arc<PricePolicy>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub payments: Arc<dyn PaymentGate>,
    pub weather: Arc<dyn WeatherSource>,
}

impl AppState {
    /// Production wiring: signed assertions, the configured settlement service
    /// and the configured weather provider.
    pub fn new(config: ServerConfig) -> Result<Self, StateError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.upstream.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        let identity = SignedAssertionVerifier::new(&config.base_url, config.assertion_max_age_secs);
        let payments = SettlementPaymentGate::new(
            http_client.clone(),
            &config.payment_service_url,
            &config.base_url,
            config.server_key.clone(),
        );
        let weather = HttpWeatherSource::new(http_client, &config.upstream)?;

        Ok(Self::with_capabilities(
            config,
            PricePolicy::reference(),
            Arc::new(identity),
            Arc::new(payments),
            Arc::new(weather),
        ))
    }

    /// Wire arbitrary capability implementations (fakes in tests).
    pub fn with_capabilities(
        config: ServerConfig,
        prices: PricePolicy,
        identity: Arc<dyn IdentityVerifier>,
        payments: Arc<dyn PaymentGate>,
        weather: Arc<dyn WeatherSource>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            prices: Arc::new(prices),
            identity,
            payments,
            weather,
        }
    }
}
