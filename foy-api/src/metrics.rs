use axum::{extract::State, http::StatusCode, response::IntoResponse};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

use crate::state::AppState;

pub struct Metrics {
    registry: Registry,
    pub ads_served: IntCounterVec,
    pub ad_events: IntCounterVec,
    pub fetch_failures: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let ads_served = IntCounterVec::new(
            Opts::new("foy_ads_served_total", "Ads returned by placement"),
            &["placement"],
        )?;
        let ad_events = IntCounterVec::new(
            Opts::new("foy_ad_events_total", "Tracking events received by type"),
            &["type"],
        )?;
        let fetch_failures = IntCounter::new(
            "foy_ad_fetch_failures_total",
            "Placement requests answered empty because the repository failed",
        )?;

        registry.register(Box::new(ads_served.clone()))?;
        registry.register(Box::new(ad_events.clone()))?;
        registry.register(Box::new(fetch_failures.clone()))?;

        Ok(Self { registry, ads_served, ad_events, fetch_failures })
    }

    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// GET /metrics
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            tracing::error!("Failed to render metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
        }
    }
}
