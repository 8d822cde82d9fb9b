use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::LazyLock;

pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static REQUESTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("weatherpay_requests_total", "Total number of requests"),
        &["route", "status"],
    )
    .unwrap()
});

pub static IDENTITY_REJECTIONS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "weatherpay_identity_rejections_total",
        "Requests rejected by the identity verifier",
    )
    .unwrap()
});

// result: paid | insufficient | unpaid | error
pub static PAYMENTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("weatherpay_payments_total", "Payment gate outcomes"),
        &["result"],
    )
    .unwrap()
});

pub static SATOSHIS_RECEIVED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "weatherpay_satoshis_received_total",
        "Satoshis confirmed by the payment gate on served requests",
    )
    .unwrap()
});

pub static UPSTREAM_FETCHES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("weatherpay_upstream_fetches_total", "Upstream weather fetches"),
        &["result"],
    )
    .unwrap()
});

pub static UPSTREAM_LATENCY: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "weatherpay_upstream_latency_seconds",
            "Upstream weather fetch latency",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
    )
    .unwrap()
});

/// Register all metrics with the registry. Call once at startup.
pub fn register_metrics() -> Result<(), prometheus::Error> {
    REGISTRY.register(Box::new(REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(IDENTITY_REJECTIONS.clone()))?;
    REGISTRY.register(Box::new(PAYMENTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SATOSHIS_RECEIVED.clone()))?;
    REGISTRY.register(Box::new(UPSTREAM_FETCHES.clone()))?;
    REGISTRY.register(Box::new(UPSTREAM_LATENCY.clone()))?;
    Ok(())
}

/// Render the registry in Prometheus text format.
pub fn metrics_output() -> Result<String, prometheus::Error> {
    use prometheus::Encoder;

    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

pub fn record_request(route: &str, status: u16) {
    REQUESTS_TOTAL
        .with_label_values(&[route, &status.to_string()])
        .inc();
}
