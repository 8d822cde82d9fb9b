//! Pay-per-request primitives shared by the weatherpay server and client.
//!
//! A request to a priced route passes through two capability layers before
//! the route handler sees it:
//!
//! - **Identity** ([`IdentityVerifier`]): checks the signed identity assertion
//!   and yields an [`IdentityContext`]
//! - **Payment** ([`PaymentGate`]): checks the payment proof against the
//!   route's price and yields a [`PaymentContext`]
//!
//! The route handler then compares the verified paid amount against the
//! [`PricePolicy`] and either serves the resource or answers 402.
//!
//! # Modules
//!
//! - [`constants`]: header names, reference prices and defaults
//! - [`context`]: request-scoped contexts, outcomes and capability traits
//! - [`identity`]: EIP-191 identity assertions (sign + verify)
//! - [`payment`]: payment proofs, settlement wire types, 402 body
//! - [`pricing`]: route price policy

pub mod constants;
pub mod context;
pub mod error;
pub mod identity;
pub mod payment;
pub mod pricing;

pub use constants::*;
pub use context::{
    IdentityContext, IdentityOutcome, IdentityVerifier, InboundRequest, PaymentContext,
    PaymentGate, PaymentGateError, PaymentOutcome,
};
pub use error::WeatherPayError;
pub use identity::{sign_assertion, verify_assertion, IdentityAssertion};
pub use payment::{
    decode_payment_proof, encode_payment_proof, parse_price_hint, PaymentProof,
    PaymentRequiredBody, SettlementRequest, SettlementResponse,
};
pub use pricing::{PricePolicy, PricePolicyBuilder};
