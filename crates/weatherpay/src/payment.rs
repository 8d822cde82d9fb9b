use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::WeatherPayError;

/// Client-supplied evidence of a payment, sent base64-encoded in the
/// `X-Payment` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProof {
    /// Amount the client claims to have paid. Only the settlement service's
    /// confirmed amount is trusted.
    pub satoshis: u64,
    /// Opaque transaction evidence understood by the settlement service.
    pub transaction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivation_prefix: Option<String>,
}

/// Body of the server's settlement call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRequest {
    pub proof: PaymentProof,
    pub required_satoshis: u64,
    /// Absolute URL of the resource being paid for.
    pub resource: String,
    pub identity_key: String,
}

/// Settlement service verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satoshis_paid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

/// The 402 response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequiredBody {
    pub message: String,
}

impl PaymentRequiredBody {
    pub fn for_price(satoshis: u64) -> Self {
        Self {
            message: format!("Payment required: {satoshis} satoshis"),
        }
    }
}

/// Base64-encode a proof for the `X-Payment` header.
pub fn encode_payment_proof(proof: &PaymentProof) -> Result<String, WeatherPayError> {
    let json = serde_json::to_vec(proof)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}

/// Decode the `X-Payment` header into a proof.
pub fn decode_payment_proof(header_value: &str) -> Result<PaymentProof, WeatherPayError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(header_value.trim())
        .map_err(|e| WeatherPayError::InvalidPayment(format!("invalid base64: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| WeatherPayError::InvalidPayment(format!("invalid JSON payload: {e}")))
}

/// Extract the required price from a 402 response.
///
/// Prefers the `X-Payment-Satoshis-Required` header value; falls back to the
/// number in a `"Payment required: N satoshis"` message.
pub fn parse_price_hint(header: Option<&str>, message: Option<&str>) -> Option<u64> {
    if let Some(price) = header.and_then(|h| h.trim().parse().ok()) {
        return Some(price);
    }
    message?
        .split_whitespace()
        .find_map(|word| word.trim_matches(|c: char| !c.is_ascii_digit()).parse().ok())
}
