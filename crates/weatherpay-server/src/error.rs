use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use weatherpay::PaymentGateError;

/// Errors that end a request before the route handler produces an outcome.
///
/// Insufficient payment and upstream failures are not errors here; the route
/// handler turns them into regular 402 / 500 outcomes.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Identity assertion missing or invalid
    #[error("identity rejected: {0}")]
    IdentityRejected(String),

    /// Settlement service failed to produce a verdict
    #[error("payment service error: {0}")]
    PaymentService(#[from] PaymentGateError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::IdentityRejected(_) => StatusCode::UNAUTHORIZED,
            ServerError::PaymentService(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ServerError::IdentityRejected(reason) => {
                HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "identity_rejected",
                    "message": reason,
                }))
            }
            ServerError::PaymentService(e) => {
                tracing::error!(error = %e, "payment service communication error");
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "payment processing failed"
                }))
            }
        }
    }
}
