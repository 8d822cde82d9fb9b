use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{HttpRequest, HttpResponse};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use weatherpay::identity::sign_ack;
use weatherpay::{
    verify_assertion, IdentityAssertion, IdentityContext, IdentityOutcome, IdentityVerifier,
    InboundRequest, SERVER_KEY_HEADER, SERVER_SIGNATURE_HEADER,
};

/// Snapshot an actix request for the capability layers.
///
/// Headers that are not valid visible ASCII are dropped.
pub fn inbound_request(req: &HttpRequest) -> InboundRequest {
    let mut inbound = InboundRequest::new(req.method().as_str(), req.path());
    for (name, value) in req.headers() {
        if let Ok(value) = value.to_str() {
            inbound.insert_header(name.as_str(), value);
        }
    }
    inbound
}

/// Verifies EIP-191 identity assertions bound to this server's base URL.
///
/// Nonces are not remembered: an assertion can be replayed until it ages out
/// of the `max_age_secs` window.
pub struct SignedAssertionVerifier {
    base_url: String,
    max_age_secs: i64,
}

impl SignedAssertionVerifier {
    pub fn new(base_url: &str, max_age_secs: i64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            max_age_secs,
        }
    }
}

#[async_trait]
impl IdentityVerifier for SignedAssertionVerifier {
    async fn verify(&self, request: &InboundRequest) -> IdentityOutcome {
        let assertion = match IdentityAssertion::from_request(request) {
            Ok(a) => a,
            Err(e) => return IdentityOutcome::Rejected(e.to_string()),
        };

        match verify_assertion(
            &assertion,
            &self.base_url,
            &request.method,
            &request.path,
            chrono::Utc::now().timestamp(),
            self.max_age_secs,
        ) {
            Ok(address) => IdentityOutcome::Verified(IdentityContext {
                identity_key: format!("{address:#x}"),
                nonce: Some(assertion.nonce),
            }),
            Err(e) => IdentityOutcome::Rejected(e.to_string()),
        }
    }
}

/// Countersign a verified request: attach the server's address and its
/// signature over the client's nonce.
pub fn acknowledge(response: &mut HttpResponse, signer: &PrivateKeySigner, identity: &IdentityContext) {
    let Some(nonce) = identity.nonce.as_deref() else {
        return;
    };
    match sign_ack(signer, nonce) {
        Ok(signature) => {
            insert_header(
                response,
                SERVER_KEY_HEADER,
                &format!("{:#x}", signer.address()),
            );
            insert_header(response, SERVER_SIGNATURE_HEADER, &signature);
        }
        Err(e) => tracing::warn!(error = %e, "failed to sign identity acknowledgement"),
    }
}

fn insert_header(response: &mut HttpResponse, name: &str, value: &str) {
    match (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        (Ok(name), Ok(value)) => {
            response.headers_mut().insert(name, value);
        }
        _ => tracing::warn!(header = name, "dropping invalid response header"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weatherpay::identity::{sign_assertion, verify_ack};

    const BASE: &str = "http://localhost:3000";

    fn signed_request(signer: &PrivateKeySigner, path: &str) -> InboundRequest {
        let assertion = sign_assertion(signer, BASE, "POST", path).unwrap();
        assertion
            .headers()
            .iter()
            .fold(InboundRequest::new("POST", path), |req, (k, v)| {
                req.with_header(k, v)
            })
    }

    #[actix_rt::test]
    async fn test_valid_assertion_is_verified() {
        let client = PrivateKeySigner::random();
        let verifier = SignedAssertionVerifier::new(BASE, 300);
        match verifier.verify(&signed_request(&client, "/weather")).await {
            IdentityOutcome::Verified(ctx) => {
                assert_eq!(ctx.identity_key, format!("{:#x}", client.address()));
                assert!(ctx.nonce.is_some());
            }
            IdentityOutcome::Rejected(reason) => panic!("rejected: {reason}"),
        }
    }

    #[actix_rt::test]
    async fn test_missing_headers_are_rejected() {
        let verifier = SignedAssertionVerifier::new(BASE, 300);
        let outcome = verifier
            .verify(&InboundRequest::new("POST", "/weather"))
            .await;
        assert!(matches!(outcome, IdentityOutcome::Rejected(r) if r.contains("X-Identity-Key")));
    }

    #[actix_rt::test]
    async fn test_assertion_for_other_server_is_rejected() {
        let client = PrivateKeySigner::random();
        let verifier = SignedAssertionVerifier::new("https://weather.example.com/", 300);
        let outcome = verifier.verify(&signed_request(&client, "/weather")).await;
        assert!(matches!(outcome, IdentityOutcome::Rejected(_)));
    }

    #[test]
    fn test_acknowledge_sets_verifiable_headers() {
        let server = PrivateKeySigner::random();
        let identity = IdentityContext {
            identity_key: "0xabc".to_string(),
            nonce: Some("nonce-1".to_string()),
        };
        let mut response = HttpResponse::Ok().finish();
        acknowledge(&mut response, &server, &identity);

        let key = response
            .headers()
            .get(SERVER_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert_eq!(key, format!("{:#x}", server.address()));
        let sig = response
            .headers()
            .get(SERVER_SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap();
        assert!(verify_ack(server.address(), "nonce-1", sig).is_ok());
    }

    #[test]
    fn test_acknowledge_without_nonce_is_noop() {
        let mut response = HttpResponse::Ok().finish();
        acknowledge(
            &mut response,
            &PrivateKeySigner::random(),
            &IdentityContext::new("0xabc"),
        );
        assert!(response.headers().get(SERVER_KEY_HEADER).is_none());
    }
}
