use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use weatherpay::identity::sign_bytes;
use weatherpay::{
    decode_payment_proof, IdentityContext, InboundRequest, PaymentContext, PaymentGate,
    PaymentGateError, PaymentOutcome, SettlementRequest, SettlementResponse, PAYMENT_HEADER,
    SETTLEMENT_IDENTITY_HEADER, SETTLEMENT_SIGNATURE_HEADER,
};

/// Payment gate that delegates verification and settlement to an external
/// settlement service.
///
/// Requests to the service are signed with the server key so the service can
/// attribute the settled funds.
pub struct SettlementPaymentGate {
    http_client: reqwest::Client,
    service_url: String,
    base_url: String,
    signer: PrivateKeySigner,
}

impl SettlementPaymentGate {
    pub fn new(
        http_client: reqwest::Client,
        service_url: &str,
        base_url: &str,
        signer: PrivateKeySigner,
    ) -> Self {
        Self {
            http_client,
            service_url: service_url.trim_end_matches('/').to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            signer,
        }
    }

    async fn settle(&self, request: &SettlementRequest) -> Result<SettlementResponse, PaymentGateError> {
        let url = format!("{}/verify-and-settle", self.service_url);
        let body_bytes = serde_json::to_vec(request)
            .map_err(|e| PaymentGateError::Encoding(e.to_string()))?;
        let signature = sign_bytes(&self.signer, &body_bytes)
            .map_err(|e| PaymentGateError::Signing(e.to_string()))?;

        let response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .header(
                SETTLEMENT_IDENTITY_HEADER,
                format!("{:#x}", self.signer.address()),
            )
            .header(SETTLEMENT_SIGNATURE_HEADER, signature)
            .body(body_bytes)
            .send()
            .await
            .map_err(|e| PaymentGateError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PaymentGateError::BadStatus {
                status: status.as_u16(),
            });
        }

        response
            .json::<SettlementResponse>()
            .await
            .map_err(|e| PaymentGateError::InvalidResponse(e.to_string()))
    }
}

/// Settlement request for the proof in `request`, or the reason the proof is
/// not worth settling.
pub fn settlement_request(
    request: &InboundRequest,
    identity: &IdentityContext,
    required_satoshis: u64,
    base_url: &str,
) -> Result<SettlementRequest, String> {
    let header = request
        .header(PAYMENT_HEADER)
        .ok_or_else(|| "no payment proof".to_string())?;
    let proof = decode_payment_proof(header).map_err(|e| e.to_string())?;

    if proof.satoshis < required_satoshis {
        return Err(format!(
            "proof offers {} of {} satoshis",
            proof.satoshis, required_satoshis
        ));
    }

    Ok(SettlementRequest {
        proof,
        required_satoshis,
        resource: format!("{}{}", base_url.trim_end_matches('/'), request.path),
        identity_key: identity.identity_key.clone(),
    })
}

/// Translate a settlement verdict into a gate outcome.
pub fn settlement_outcome(response: SettlementResponse) -> Result<PaymentOutcome, PaymentGateError> {
    if !response.success {
        return Ok(PaymentOutcome::Unpaid(
            response
                .error_reason
                .unwrap_or_else(|| "settlement rejected".to_string()),
        ));
    }

    match (response.satoshis_paid, response.reference) {
        (Some(satoshis_paid), Some(reference)) if !reference.is_empty() => {
            Ok(PaymentOutcome::Paid(PaymentContext {
                satoshis_paid,
                reference,
            }))
        }
        _ => Err(PaymentGateError::InvalidResponse(
            "successful settlement without amount or reference".to_string(),
        )),
    }
}

#[async_trait]
impl PaymentGate for SettlementPaymentGate {
    async fn check(
        &self,
        request: &InboundRequest,
        identity: &IdentityContext,
        required_satoshis: u64,
    ) -> Result<PaymentOutcome, PaymentGateError> {
        let settlement =
            match settlement_request(request, identity, required_satoshis, &self.base_url) {
                Ok(s) => s,
                Err(reason) => return Ok(PaymentOutcome::Unpaid(reason)),
            };

        tracing::info!(
            identity = %identity.identity_key,
            offered = settlement.proof.satoshis,
            required = required_satoshis,
            "payment attempt"
        );

        let response = self.settle(&settlement).await?;
        let outcome = settlement_outcome(response)?;
        if let PaymentOutcome::Unpaid(ref reason) = outcome {
            tracing::warn!(identity = %identity.identity_key, reason = %reason, "payment rejected");
        }
        Ok(outcome)
    }
}
