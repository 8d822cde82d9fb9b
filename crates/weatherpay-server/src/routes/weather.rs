use actix_web::{web, HttpRequest, HttpResponse};
use weatherpay::{IdentityOutcome, PaymentOutcome};

use crate::error::ServerError;
use crate::handler::handle_weather_request;
use crate::identity::{acknowledge, inbound_request};
use crate::metrics::{record_request, IDENTITY_REJECTIONS, PAYMENTS_TOTAL};
use crate::state::AppState;

const ROUTE: &str = "/weather";

/// POST /weather - identity verifier, then payment gate, then the paid handler.
pub async fn weather(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse, ServerError> {
    let inbound = inbound_request(&req);

    let identity = match state.identity.verify(&inbound).await {
        IdentityOutcome::Verified(ctx) => ctx,
        IdentityOutcome::Rejected(reason) => {
            tracing::warn!(reason = %reason, "identity rejected");
            IDENTITY_REJECTIONS.inc();
            record_request(ROUTE, 401);
            return Err(ServerError::IdentityRejected(reason));
        }
    };

    let required = state.prices.price_for(req.path());
    let payment = match state.payments.check(&inbound, &identity, required).await {
        Ok(outcome) => outcome,
        Err(e) => {
            PAYMENTS_TOTAL.with_label_values(&["error"]).inc();
            record_request(ROUTE, 500);
            return Err(e.into());
        }
    };
    record_payment(&payment, required);

    let outcome = handle_weather_request(payment.context(), required, state.weather.as_ref()).await;
    record_request(ROUTE, outcome.status());

    let mut response = outcome.into_response();
    acknowledge(&mut response, &state.config.server_key, &identity);
    Ok(response)
}

fn record_payment(payment: &PaymentOutcome, required: u64) {
    let label = match payment {
        PaymentOutcome::Paid(ctx) if ctx.covers(required) => "paid",
        PaymentOutcome::Paid(_) => "insufficient",
        PaymentOutcome::Unpaid(reason) => {
            tracing::debug!(reason = %reason, "no payment");
            "unpaid"
        }
    };
    PAYMENTS_TOTAL.with_label_values(&[label]).inc();
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(ROUTE, web::post().to(weather));
}
