use weatherpay::WeatherPayError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("missing required environment variable: {0}")]
    MissingConfig(&'static str),

    #[error("invalid private key in {0}")]
    InvalidKey(&'static str),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("wallet error: {0}")]
    Wallet(String),

    #[error(transparent)]
    Protocol(#[from] WeatherPayError),
}
