//! Signed identity assertions.
//!
//! A client proves control of a secp256k1 key by signing (EIP-191) a message
//! bound to the server's base URL, the request method and path, a timestamp
//! and a random nonce:
//!
//! ```text
//! weatherpay-identity:{base_url}:{METHOD}:{path}:{timestamp}:{nonce}
//! ```
//!
//! The verified identity key is the recovered signer address. The server
//! answers with its own signature over the client nonce so the client can
//! authenticate the server in turn.

use alloy::primitives::{Address, Signature};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;

use crate::constants::{
    ACK_DOMAIN, ASSERTION_DOMAIN, IDENTITY_KEY_HEADER, IDENTITY_NONCE_HEADER,
    IDENTITY_SIGNATURE_HEADER, IDENTITY_TIMESTAMP_HEADER,
};
use crate::context::InboundRequest;
use crate::error::WeatherPayError;

/// The four identity headers a client attaches to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityAssertion {
    /// `0x`-prefixed address the client claims.
    pub identity_key: String,
    pub nonce: String,
    /// Unix seconds.
    pub timestamp: i64,
    /// `0x`-prefixed hex of the 65-byte signature.
    pub signature: String,
}

impl IdentityAssertion {
    /// Read an assertion from request headers.
    pub fn from_request(request: &InboundRequest) -> Result<Self, WeatherPayError> {
        let identity_key = request
            .header(IDENTITY_KEY_HEADER)
            .ok_or(WeatherPayError::MissingHeader(IDENTITY_KEY_HEADER))?;
        let nonce = request
            .header(IDENTITY_NONCE_HEADER)
            .ok_or(WeatherPayError::MissingHeader(IDENTITY_NONCE_HEADER))?;
        let timestamp = request
            .header(IDENTITY_TIMESTAMP_HEADER)
            .ok_or(WeatherPayError::MissingHeader(IDENTITY_TIMESTAMP_HEADER))?
            .trim()
            .parse::<i64>()
            .map_err(|e| WeatherPayError::SignatureError(format!("invalid timestamp: {e}")))?;
        let signature = request
            .header(IDENTITY_SIGNATURE_HEADER)
            .ok_or(WeatherPayError::MissingHeader(IDENTITY_SIGNATURE_HEADER))?;

        Ok(Self {
            identity_key: identity_key.trim().to_string(),
            nonce: nonce.to_string(),
            timestamp,
            signature: signature.trim().to_string(),
        })
    }

    /// Header name/value pairs for an outgoing request.
    pub fn headers(&self) -> [(&'static str, String); 4] {
        [
            (IDENTITY_KEY_HEADER, self.identity_key.clone()),
            (IDENTITY_NONCE_HEADER, self.nonce.clone()),
            (IDENTITY_TIMESTAMP_HEADER, self.timestamp.to_string()),
            (IDENTITY_SIGNATURE_HEADER, self.signature.clone()),
        ]
    }
}

/// The exact bytes a client signs for an assertion.
pub fn assertion_message(
    base_url: &str,
    method: &str,
    path: &str,
    timestamp: i64,
    nonce: &str,
) -> String {
    format!(
        "{ASSERTION_DOMAIN}:{}:{}:{path}:{timestamp}:{nonce}",
        base_url.trim_end_matches('/'),
        method.to_ascii_uppercase(),
    )
}

/// Sign an assertion for `method path` on the server at `base_url`, stamped now
/// with a fresh random nonce.
pub fn sign_assertion(
    signer: &PrivateKeySigner,
    base_url: &str,
    method: &str,
    path: &str,
) -> Result<IdentityAssertion, WeatherPayError> {
    let timestamp = chrono::Utc::now().timestamp();
    let nonce = uuid::Uuid::new_v4().to_string();
    sign_assertion_at(signer, base_url, method, path, timestamp, &nonce)
}

/// Sign an assertion with an explicit timestamp and nonce.
pub fn sign_assertion_at(
    signer: &PrivateKeySigner,
    base_url: &str,
    method: &str,
    path: &str,
    timestamp: i64,
    nonce: &str,
) -> Result<IdentityAssertion, WeatherPayError> {
    let message = assertion_message(base_url, method, path, timestamp, nonce);
    Ok(IdentityAssertion {
        identity_key: format!("{:#x}", signer.address()),
        nonce: nonce.to_string(),
        timestamp,
        signature: sign_bytes(signer, message.as_bytes())?,
    })
}

/// Verify an assertion and return the signer's address.
///
/// `now` is unix seconds; the assertion must lie within `max_age_secs` of it
/// in either direction.
pub fn verify_assertion(
    assertion: &IdentityAssertion,
    base_url: &str,
    method: &str,
    path: &str,
    now: i64,
    max_age_secs: i64,
) -> Result<Address, WeatherPayError> {
    let claimed: Address = assertion
        .identity_key
        .parse()
        .map_err(|_| WeatherPayError::InvalidIdentityKey(assertion.identity_key.clone()))?;

    let age_secs = now.saturating_sub(assertion.timestamp);
    if age_secs.abs() > max_age_secs {
        return Err(WeatherPayError::AssertionExpired {
            age_secs,
            max_age_secs,
        });
    }

    let message = assertion_message(
        base_url,
        method,
        path,
        assertion.timestamp,
        &assertion.nonce,
    );
    let recovered = recover_signer(message.as_bytes(), &assertion.signature)?;
    if recovered != claimed {
        return Err(WeatherPayError::IdentityMismatch {
            claimed: format!("{claimed:#x}"),
            recovered: format!("{recovered:#x}"),
        });
    }
    Ok(recovered)
}

/// Server acknowledgement over the client's nonce.
pub fn sign_ack(signer: &PrivateKeySigner, client_nonce: &str) -> Result<String, WeatherPayError> {
    sign_bytes(signer, format!("{ACK_DOMAIN}:{client_nonce}").as_bytes())
}

/// Check a server acknowledgement against the expected server address.
pub fn verify_ack(
    server_key: Address,
    client_nonce: &str,
    signature: &str,
) -> Result<(), WeatherPayError> {
    let recovered = recover_signer(format!("{ACK_DOMAIN}:{client_nonce}").as_bytes(), signature)?;
    if recovered != server_key {
        return Err(WeatherPayError::IdentityMismatch {
            claimed: format!("{server_key:#x}"),
            recovered: format!("{recovered:#x}"),
        });
    }
    Ok(())
}

/// EIP-191 sign arbitrary bytes, returning `0x`-prefixed hex.
pub fn sign_bytes(signer: &PrivateKeySigner, message: &[u8]) -> Result<String, WeatherPayError> {
    let sig = signer
        .sign_message_sync(message)
        .map_err(|e| WeatherPayError::SignatureError(format!("signing failed: {e}")))?;
    Ok(encode_signature_hex(&sig))
}

/// Recover the EIP-191 signer of `message` from a hex signature.
pub fn recover_signer(message: &[u8], signature_hex: &str) -> Result<Address, WeatherPayError> {
    let hex = signature_hex.strip_prefix("0x").unwrap_or(signature_hex);
    let bytes = alloy::hex::decode(hex)
        .map_err(|e| WeatherPayError::SignatureError(format!("invalid hex signature: {e}")))?;
    if bytes.len() != 65 {
        return Err(WeatherPayError::SignatureError(format!(
            "signature must be 65 bytes, got {}",
            bytes.len()
        )));
    }
    let sig = Signature::from_raw(&bytes)
        .map_err(|e| WeatherPayError::SignatureError(format!("invalid signature: {e}")))?;
    sig.recover_address_from_msg(message)
        .map_err(|e| WeatherPayError::SignatureError(format!("recovery failed: {e}")))
}

fn encode_signature_hex(sig: &Signature) -> String {
    format!("0x{}", alloy::hex::encode(sig.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:3000";

    fn request_with(assertion: &IdentityAssertion) -> InboundRequest {
        assertion
            .headers()
            .iter()
            .fold(InboundRequest::new("POST", "/weather"), |req, (k, v)| {
                req.with_header(k, v)
            })
    }

    #[test]
    fn test_sign_and_verify_roundtrip() {
        let signer = PrivateKeySigner::random();
        let assertion = sign_assertion_at(&signer, BASE, "POST", "/weather", 1_000, "n-1").unwrap();

        let recovered =
            verify_assertion(&assertion, BASE, "POST", "/weather", 1_010, 300).unwrap();
        assert_eq!(recovered, signer.address());
        assert_eq!(assertion.identity_key, format!("{:#x}", signer.address()));
    }

    #[test]
    fn test_headers_parse_back() {
        let signer = PrivateKeySigner::random();
        let assertion = sign_assertion(&signer, BASE, "POST", "/weather").unwrap();
        let parsed = IdentityAssertion::from_request(&request_with(&assertion)).unwrap();
        assert_eq!(parsed, assertion);
    }

    #[test]
    fn test_missing_header_is_reported() {
        let req = InboundRequest::new("POST", "/weather").with_header(IDENTITY_KEY_HEADER, "0x00");
        let err = IdentityAssertion::from_request(&req).unwrap_err();
        assert!(matches!(
            err,
            WeatherPayError::MissingHeader(IDENTITY_NONCE_HEADER)
        ));
    }

    #[test]
    fn test_trailing_slash_in_base_url_is_ignored() {
        let signer = PrivateKeySigner::random();
        let assertion =
            sign_assertion_at(&signer, "http://localhost:3000/", "post", "/weather", 5, "n")
                .unwrap();
        assert!(verify_assertion(&assertion, BASE, "POST", "/weather", 5, 300).is_ok());
    }

    #[test]
    fn test_wrong_path_is_rejected() {
        let signer = PrivateKeySigner::random();
        let assertion = sign_assertion_at(&signer, BASE, "POST", "/weather", 5, "n").unwrap();
        let err = verify_assertion(&assertion, BASE, "POST", "/other", 5, 300).unwrap_err();
        assert!(matches!(err, WeatherPayError::IdentityMismatch { .. }));
    }

    #[test]
    fn test_other_audience_is_rejected() {
        let signer = PrivateKeySigner::random();
        let assertion = sign_assertion_at(&signer, BASE, "POST", "/weather", 5, "n").unwrap();
        let err =
            verify_assertion(&assertion, "https://evil.example", "POST", "/weather", 5, 300)
                .unwrap_err();
        assert!(matches!(err, WeatherPayError::IdentityMismatch { .. }));
    }

    #[test]
    fn test_claimed_key_must_match_signer() {
        let signer = PrivateKeySigner::random();
        let other = PrivateKeySigner::random();
        let mut assertion = sign_assertion_at(&signer, BASE, "POST", "/weather", 5, "n").unwrap();
        assertion.identity_key = format!("{:#x}", other.address());
        let err = verify_assertion(&assertion, BASE, "POST", "/weather", 5, 300).unwrap_err();
        assert!(matches!(err, WeatherPayError::IdentityMismatch { .. }));
    }

    #[test]
    fn test_stale_and_future_assertions_are_rejected() {
        let signer = PrivateKeySigner::random();
        let assertion = sign_assertion_at(&signer, BASE, "POST", "/weather", 1_000, "n").unwrap();

        let stale = verify_assertion(&assertion, BASE, "POST", "/weather", 1_301, 300);
        assert!(matches!(
            stale,
            Err(WeatherPayError::AssertionExpired { age_secs: 301, .. })
        ));

        let future = verify_assertion(&assertion, BASE, "POST", "/weather", 699, 300);
        assert!(matches!(
            future,
            Err(WeatherPayError::AssertionExpired { age_secs: -301, .. })
        ));

        assert!(verify_assertion(&assertion, BASE, "POST", "/weather", 1_300, 300).is_ok());
    }

    #[test]
    fn test_garbage_key_and_signature() {
        let signer = PrivateKeySigner::random();
        let mut assertion = sign_assertion_at(&signer, BASE, "POST", "/weather", 5, "n").unwrap();

        assertion.identity_key = "not-an-address".to_string();
        assert!(matches!(
            verify_assertion(&assertion, BASE, "POST", "/weather", 5, 300),
            Err(WeatherPayError::InvalidIdentityKey(_))
        ));

        assertion.identity_key = format!("{:#x}", signer.address());
        assertion.signature = "0xdead".to_string();
        assert!(matches!(
            verify_assertion(&assertion, BASE, "POST", "/weather", 5, 300),
            Err(WeatherPayError::SignatureError(_))
        ));
    }

    #[test]
    fn test_ack_roundtrip() {
        let server = PrivateKeySigner::random();
        let sig = sign_ack(&server, "nonce-42").unwrap();
        assert!(verify_ack(server.address(), "nonce-42", &sig).is_ok());
        assert!(verify_ack(server.address(), "nonce-43", &sig).is_err());
        assert!(verify_ack(PrivateKeySigner::random().address(), "nonce-42", &sig).is_err());
    }
}
