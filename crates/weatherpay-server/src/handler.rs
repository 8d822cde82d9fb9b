//! The paid weather route's decision logic.
//!
//! A request moves `AwaitingPayment` → `Fetching` → `Responded`. Insufficient
//! payment answers straight from `AwaitingPayment` without touching the
//! upstream; a sufficient payment triggers exactly one fetch.

use actix_web::HttpResponse;
use weatherpay::{PaymentContext, PaymentRequiredBody, PRICE_HINT_HEADER};

use crate::metrics::SATOSHIS_RECEIVED;
use crate::upstream::WeatherSource;

/// Body of the 500 returned when the upstream fetch fails.
pub const UPSTREAM_FAILURE_MESSAGE: &str = "Failed to fetch weather data";

/// How a paid-route request ended.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherOutcome {
    /// Upstream payload, passed through unchanged.
    Delivered(serde_json::Value),
    PaymentRequired { required_satoshis: u64 },
    UpstreamFailed,
}

impl WeatherOutcome {
    pub fn status(&self) -> u16 {
        match self {
            WeatherOutcome::Delivered(_) => 200,
            WeatherOutcome::PaymentRequired { .. } => 402,
            WeatherOutcome::UpstreamFailed => 500,
        }
    }

    pub fn into_response(self) -> HttpResponse {
        match self {
            WeatherOutcome::Delivered(payload) => HttpResponse::Ok().json(payload),
            WeatherOutcome::PaymentRequired { required_satoshis } => {
                HttpResponse::PaymentRequired()
                    .insert_header((PRICE_HINT_HEADER, required_satoshis.to_string()))
                    .json(PaymentRequiredBody::for_price(required_satoshis))
            }
            WeatherOutcome::UpstreamFailed => HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": UPSTREAM_FAILURE_MESSAGE })),
        }
    }
}

/// Return the payment context if it covers `required_satoshis`.
pub fn sufficient_payment(
    payment: Option<&PaymentContext>,
    required_satoshis: u64,
) -> Option<&PaymentContext> {
    payment.filter(|ctx| ctx.covers(required_satoshis))
}

/// Enforce the route price, then fetch the weather report once.
pub async fn handle_weather_request(
    payment: Option<&PaymentContext>,
    required_satoshis: u64,
    source: &dyn WeatherSource,
) -> WeatherOutcome {
    let Some(paid) = sufficient_payment(payment, required_satoshis) else {
        tracing::info!(
            paid = payment.map(|p| p.satoshis_paid).unwrap_or(0),
            required = required_satoshis,
            "insufficient payment"
        );
        return WeatherOutcome::PaymentRequired { required_satoshis };
    };

    tracing::info!(
        paid = paid.satoshis_paid,
        reference = %paid.reference,
        "payment received, fetching weather"
    );

    match source.fetch().await {
        Ok(payload) => {
            SATOSHIS_RECEIVED.inc_by(paid.satoshis_paid);
            tracing::debug!("weather data fetched");
            WeatherOutcome::Delivered(payload)
        }
        Err(e) => {
            tracing::error!(error = %e, reference = %paid.reference, "error fetching weather data");
            WeatherOutcome::UpstreamFailed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::UpstreamError;
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl WeatherSource for CountingSource {
        async fn fetch(&self) -> Result<serde_json::Value, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(UpstreamError::Request("connection refused".to_string()))
            } else {
                Ok(serde_json::json!({ "main": { "temp": 12.0 } }))
            }
        }
    }

    fn paid(satoshis: u64) -> PaymentContext {
        PaymentContext {
            satoshis_paid: satoshis,
            reference: format!("ref-{satoshis}"),
        }
    }

    #[actix_rt::test]
    async fn test_exact_price_delivers_payload() {
        let source = CountingSource::new(false);
        let outcome = handle_weather_request(Some(&paid(333)), 333, &source).await;
        assert_eq!(
            outcome,
            WeatherOutcome::Delivered(serde_json::json!({ "main": { "temp": 12.0 } }))
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[actix_rt::test]
    async fn test_one_short_requires_payment_without_fetch() {
        let source = CountingSource::new(false);
        let outcome = handle_weather_request(Some(&paid(332)), 333, &source).await;
        assert_eq!(
            outcome,
            WeatherOutcome::PaymentRequired {
                required_satoshis: 333
            }
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[actix_rt::test]
    async fn test_absent_payment_requires_payment() {
        let source = CountingSource::new(false);
        let outcome = handle_weather_request(None, 333, &source).await;
        assert_eq!(outcome.status(), 402);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[actix_rt::test]
    async fn test_upstream_failure_is_500_after_single_attempt() {
        let source = CountingSource::new(true);
        let outcome = handle_weather_request(Some(&paid(1_000)), 333, &source).await;
        assert_eq!(outcome, WeatherOutcome::UpstreamFailed);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[actix_rt::test]
    async fn test_payment_required_response_shape() {
        let resp = WeatherOutcome::PaymentRequired {
            required_satoshis: 333,
        }
        .into_response();
        assert_eq!(resp.status(), 402);
        assert_eq!(
            resp.headers()
                .get(PRICE_HINT_HEADER)
                .and_then(|v| v.to_str().ok()),
            Some("333")
        );
        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "message": "Payment required: 333 satoshis" })
        );
    }

    proptest! {
        #[test]
        fn prop_underpayment_never_sufficient(paid_sats in 0u64..333) {
            prop_assert!(sufficient_payment(Some(&paid(paid_sats)), 333).is_none());
        }

        #[test]
        fn prop_payment_at_or_above_price_sufficient(paid_sats in 333u64..=u64::MAX) {
            let ctx = paid(paid_sats);
            prop_assert_eq!(sufficient_payment(Some(&ctx), 333), Some(&ctx));
        }

        #[test]
        fn prop_underpayment_never_fetches(paid_sats in 0u64..333) {
            let source = CountingSource::new(false);
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let outcome =
                runtime.block_on(handle_weather_request(Some(&paid(paid_sats)), 333, &source));
            prop_assert_eq!(outcome.status(), 402);
            prop_assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        }
    }
}
