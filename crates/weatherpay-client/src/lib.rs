//! Client payment agent for the pay-per-request weather API.
//!
//! Handles the 402 flow: signed request -> 402 with price -> wallet proof ->
//! one paid retry.
//!
//! ```no_run
//! use weatherpay_client::{ClientConfig, HttpWallet, PaymentAgent, RequestOptions};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), weatherpay_client::ClientError> {
//! let config = ClientConfig::from_env()?;
//! let agent = PaymentAgent::new(HttpWallet::new(reqwest::Client::new(), &config.wallet_url))?;
//! let resp = agent
//!     .fetch_with_payment(&config.weather_url, &RequestOptions::post(), &config.credentials)
//!     .await?;
//! println!("{:?}", resp.outcome());
//! # Ok(())
//! # }
//! ```

mod agent;
mod config;
mod error;
mod outcome;
mod wallet;

pub use agent::{AgentResponse, PaymentAgent, RequestOptions};
pub use config::{ClientConfig, Credentials, DEFAULT_WALLET_URL, DEFAULT_WEATHER_URL};
pub use error::ClientError;
pub use outcome::{FetchOutcome, WeatherSummary};
pub use wallet::{HttpWallet, PaymentWallet};

pub use weatherpay::PaymentProof;
