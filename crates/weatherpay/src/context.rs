//! Request-scoped contexts and the two capability traits that produce them.
//!
//! - [`IdentityVerifier`]: turns an identity assertion into an [`IdentityContext`]
//! - [`PaymentGate`]: turns a payment proof into a [`PaymentContext`]
//!
//! Both capabilities see an [`InboundRequest`], a framework-neutral snapshot of
//! the HTTP request, so they can be faked in tests without a web server.

use async_trait::async_trait;
use std::collections::BTreeMap;

/// Snapshot of the parts of an HTTP request the capability layers read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundRequest {
    pub method: String,
    pub path: String,
    headers: BTreeMap<String, String>,
}

impl InboundRequest {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            headers: BTreeMap::new(),
        }
    }

    /// Add a header. Names are case-insensitive; a repeated name keeps the last value.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.insert_header(name, value);
        self
    }

    pub fn insert_header(&mut self, name: &str, value: &str) {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Verified identity attached to a request by the [`IdentityVerifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    /// Opaque identity key. For signed assertions, the `0x` address of the signer.
    pub identity_key: String,
    /// Client nonce the assertion was bound to, echoed back in the server's acknowledgement.
    pub nonce: Option<String>,
}

impl IdentityContext {
    pub fn new(identity_key: impl Into<String>) -> Self {
        Self {
            identity_key: identity_key.into(),
            nonce: None,
        }
    }
}

/// Verified payment attached to a request by the [`PaymentGate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentContext {
    pub satoshis_paid: u64,
    /// Opaque token identifying the settled payment.
    pub reference: String,
}

impl PaymentContext {
    /// Whether the verified amount covers `required` satoshis.
    pub fn covers(&self, required: u64) -> bool {
        self.satoshis_paid >= required
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityOutcome {
    Verified(IdentityContext),
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Paid(PaymentContext),
    /// No acceptable proof. The reason is for logs only; callers answer 402.
    Unpaid(String),
}

impl PaymentOutcome {
    /// The payment context, if the gate populated one.
    pub fn context(&self) -> Option<&PaymentContext> {
        match self {
            PaymentOutcome::Paid(ctx) => Some(ctx),
            PaymentOutcome::Unpaid(_) => None,
        }
    }
}

/// The payment gate could not reach a verdict.
#[derive(Debug, thiserror::Error)]
pub enum PaymentGateError {
    #[error("settlement service unreachable: {0}")]
    Unreachable(String),

    #[error("settlement service returned {status}")]
    BadStatus { status: u16 },

    #[error("invalid settlement response: {0}")]
    InvalidResponse(String),

    #[error("failed to encode settlement request: {0}")]
    Encoding(String),

    #[error("failed to sign settlement request: {0}")]
    Signing(String),
}

/// Validates a request's identity assertion.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, request: &InboundRequest) -> IdentityOutcome;
}

/// Validates a request's payment proof against the route's required price.
///
/// Implementations must not charge for proofs that cannot cover
/// `required_satoshis`.
#[async_trait]
pub trait PaymentGate: Send + Sync {
    async fn check(
        &self,
        request: &InboundRequest,
        identity: &IdentityContext,
        required_satoshis: u64,
    ) -> Result<PaymentOutcome, PaymentGateError>;
}
