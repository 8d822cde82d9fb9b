use thiserror::Error;

/// Errors returned by weatherpay primitives.
#[derive(Debug, Error)]
pub enum WeatherPayError {
    #[error("missing header: {0}")]
    MissingHeader(&'static str),

    #[error("invalid identity key: {0}")]
    InvalidIdentityKey(String),

    #[error("signature error: {0}")]
    SignatureError(String),

    #[error("assertion expired: issued {age_secs}s from now, limit {max_age_secs}s")]
    AssertionExpired { age_secs: i64, max_age_secs: i64 },

    #[error("identity mismatch: claimed {claimed}, signed by {recovered}")]
    IdentityMismatch { claimed: String, recovered: String },

    #[error("invalid payment: {0}")]
    InvalidPayment(String),

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}
