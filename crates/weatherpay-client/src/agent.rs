use alloy::primitives::Address;
use reqwest::header::HeaderMap;
use serde_json::Value;
use weatherpay::identity::{sign_assertion, verify_ack};
use weatherpay::{
    encode_payment_proof, parse_price_hint, PAYMENT_HEADER, PRICE_HINT_HEADER, SERVER_KEY_HEADER,
    SERVER_SIGNATURE_HEADER,
};

use crate::config::Credentials;
use crate::error::ClientError;
use crate::outcome::FetchOutcome;
use crate::wallet::PaymentWallet;

/// Method, extra headers and optional JSON body for a request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: reqwest::Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: reqwest::Method::GET,
            headers: Vec::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn post() -> Self {
        Self {
            method: reqwest::Method::POST,
            ..Self::default()
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Final response seen by the agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentResponse {
    pub status: u16,
    /// Parsed body; `Null` when the body was not JSON.
    pub json_body: Value,
    /// Price hint from a 402, header first, then the body message.
    pub price_hint: Option<u64>,
    /// Server address, present only when its acknowledgement verified.
    pub server_key: Option<String>,
}

impl AgentResponse {
    pub fn outcome(&self) -> FetchOutcome {
        FetchOutcome::classify(self)
    }
}

/// Client payment agent.
///
/// Sends the identity-signed request; on 402 asks its wallet for a proof of
/// the hinted amount and retries exactly once.
pub struct PaymentAgent<W: PaymentWallet> {
    http: reqwest::Client,
    wallet: W,
}

impl<W: PaymentWallet> PaymentAgent<W> {
    pub fn new(wallet: W) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ClientError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, wallet })
    }

    /// Create an agent with a custom reqwest::Client.
    pub fn with_http_client(wallet: W, http: reqwest::Client) -> Self {
        Self { http, wallet }
    }

    pub async fn fetch_with_payment(
        &self,
        url: &str,
        options: &RequestOptions,
        credentials: &Credentials,
    ) -> Result<AgentResponse, ClientError> {
        let target = url::Url::parse(url).map_err(|e| ClientError::InvalidUrl(format!("{url}: {e}")))?;

        let first = self.send(&target, options, credentials, None).await?;
        if first.status != 402 {
            return Ok(first);
        }

        let Some(satoshis) = first.price_hint else {
            tracing::warn!("402 without a price hint; not paying");
            return Ok(first);
        };

        let recipient = first.server_key.clone().unwrap_or_else(|| target.origin().ascii_serialization());
        tracing::info!(satoshis, recipient = %recipient, "payment required, paying");

        let proof = self
            .wallet
            .create_payment(satoshis, &recipient, &credentials.identity_key())
            .await?;
        let encoded = encode_payment_proof(&proof)?;

        self.send(&target, options, credentials, Some(&encoded)).await
    }

    async fn send(
        &self,
        target: &url::Url,
        options: &RequestOptions,
        credentials: &Credentials,
        payment: Option<&str>,
    ) -> Result<AgentResponse, ClientError> {
        let base_url = target.origin().ascii_serialization();
        let assertion = sign_assertion(
            credentials.signer(),
            &base_url,
            options.method.as_str(),
            target.path(),
        )?;

        let mut req = self.http.request(options.method.clone(), target.clone());
        for (name, value) in &options.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        for (name, value) in assertion.headers() {
            req = req.header(name, value);
        }
        if let Some(encoded) = payment {
            req = req.header(PAYMENT_HEADER, encoded);
        }
        if let Some(ref body) = options.body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ClientError::Http(format!("request failed: {e}")))?;

        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ClientError::Http(format!("failed to read body: {e}")))?;
        let json_body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        let price_hint = if status == 402 {
            parse_price_hint(
                header_str(&headers, PRICE_HINT_HEADER),
                json_body.get("message").and_then(Value::as_str),
            )
        } else {
            None
        };

        Ok(AgentResponse {
            status,
            price_hint,
            server_key: verified_server_key(&headers, &assertion.nonce),
            json_body,
        })
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// The server key from the response, if its signature over our nonce checks out.
fn verified_server_key(headers: &HeaderMap, nonce: &str) -> Option<String> {
    let key = header_str(headers, SERVER_KEY_HEADER)?;
    let signature = header_str(headers, SERVER_SIGNATURE_HEADER)?;
    let address: Address = key.parse().ok()?;
    match verify_ack(address, nonce, signature) {
        Ok(()) => Some(format!("{address:#x}")),
        Err(e) => {
            tracing::warn!(error = %e, "server acknowledgement did not verify");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::local::PrivateKeySigner;
    use reqwest::header::HeaderValue;
    use weatherpay::identity::sign_ack;

    #[test]
    fn test_request_options_builders() {
        let opts = RequestOptions::post()
            .header("Content-Type", "application/json")
            .json(serde_json::json!({ "city": 1 }));
        assert_eq!(opts.method, reqwest::Method::POST);
        assert_eq!(opts.headers.len(), 1);
        assert!(opts.body.is_some());
        assert_eq!(RequestOptions::default().method, reqwest::Method::GET);
    }

    #[test]
    fn test_verified_server_key_accepts_valid_ack() {
        let server = PrivateKeySigner::random();
        let mut headers = HeaderMap::new();
        headers.insert(
            SERVER_KEY_HEADER,
            HeaderValue::from_str(&format!("{:#x}", server.address())).unwrap(),
        );
        headers.insert(
            SERVER_SIGNATURE_HEADER,
            HeaderValue::from_str(&sign_ack(&server, "nonce-1").unwrap()).unwrap(),
        );

        assert_eq!(
            verified_server_key(&headers, "nonce-1"),
            Some(format!("{:#x}", server.address()))
        );
        assert_eq!(verified_server_key(&headers, "nonce-2"), None);
    }

    #[test]
    fn test_verified_server_key_requires_both_headers() {
        assert_eq!(verified_server_key(&HeaderMap::new(), "nonce"), None);
    }
}
