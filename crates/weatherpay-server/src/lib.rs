//! HTTP server for the pay-per-request weather API.
//!
//! `POST /weather` runs every request through the identity verifier and then
//! the payment gate before the route handler decides between 200, 402 and 500.
//! `GET /non-protected` and `OPTIONS` on any path skip both checks.

pub mod config;
pub mod cors;
pub mod error;
pub mod handler;
pub mod identity;
pub mod metrics;
pub mod payment;
pub mod routes;
pub mod state;
pub mod upstream;

pub use config::{ConfigError, ServerConfig, UpstreamConfig};
pub use error::ServerError;
pub use handler::{handle_weather_request, WeatherOutcome};
pub use identity::SignedAssertionVerifier;
pub use payment::SettlementPaymentGate;
pub use state::{AppState, StateError};
pub use upstream::{HttpWeatherSource, UpstreamError, WeatherSource};
