use async_trait::async_trait;
use serde::Serialize;
use weatherpay::PaymentProof;

use crate::error::ClientError;

/// Produces payment proofs the server's settlement service accepts.
#[async_trait]
pub trait PaymentWallet: Send + Sync {
    async fn create_payment(
        &self,
        satoshis: u64,
        recipient: &str,
        identity_key: &str,
    ) -> Result<PaymentProof, ClientError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePaymentRequest<'a> {
    satoshis: u64,
    recipient: &'a str,
    identity_key: &'a str,
}

/// Wallet reachable over HTTP at `POST {base_url}/createPayment`.
pub struct HttpWallet {
    http: reqwest::Client,
    base_url: String,
}

impl HttpWallet {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PaymentWallet for HttpWallet {
    async fn create_payment(
        &self,
        satoshis: u64,
        recipient: &str,
        identity_key: &str,
    ) -> Result<PaymentProof, ClientError> {
        let url = format!("{}/createPayment", self.base_url);
        tracing::debug!(satoshis, recipient, "requesting payment from wallet");

        let resp = self
            .http
            .post(&url)
            .json(&CreatePaymentRequest {
                satoshis,
                recipient,
                identity_key,
            })
            .send()
            .await
            .map_err(|e| ClientError::Wallet(format!("wallet unreachable: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Wallet(format!("wallet returned {status}")));
        }

        resp.json::<PaymentProof>()
            .await
            .map_err(|e| ClientError::Wallet(format!("invalid wallet response: {e}")))
    }
}
