//! # Prometheus Metrics
//!
//! Operational counters for the pledge node, scraped from `/metrics` on the
//! metrics port. Everything lives in a dedicated registry prefixed `pledge_`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use pledge_contracts::{CampaignEvent, ErrorKind, Receipt};
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Calls that changed the ledger.
    pub calls_accepted_total: IntCounter,
    /// Rejected calls, labelled by failure class.
    pub calls_rejected_total: IntCounterVec,
    pub contributions_total: IntCounter,
    pub withdrawals_total: IntCounter,
    pub refunds_total: IntCounter,
    pub current_slot: IntGauge,
    pub open_campaigns: IntGauge,
    pub call_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers every metric. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("pledge".into()), None)?;

        let calls_accepted_total =
            IntCounter::new("calls_accepted_total", "Signed calls applied to the ledger")?;
        registry.register(Box::new(calls_accepted_total.clone()))?;

        let calls_rejected_total = IntCounterVec::new(
            Opts::new("calls_rejected_total", "Signed calls rejected, by reason"),
            &["reason"],
        )?;
        registry.register(Box::new(calls_rejected_total.clone()))?;

        let contributions_total =
            IntCounter::new("contributions_total", "Accepted contributions")?;
        registry.register(Box::new(contributions_total.clone()))?;

        let withdrawals_total =
            IntCounter::new("withdrawals_total", "Owner withdrawals of successful campaigns")?;
        registry.register(Box::new(withdrawals_total.clone()))?;

        let refunds_total =
            IntCounter::new("refunds_total", "Refunds paid from failed campaigns")?;
        registry.register(Box::new(refunds_total.clone()))?;

        let current_slot = IntGauge::new("current_slot", "Current ledger slot")?;
        registry.register(Box::new(current_slot.clone()))?;

        let open_campaigns =
            IntGauge::new("open_campaigns", "Campaigns not yet finalized")?;
        registry.register(Box::new(open_campaigns.clone()))?;

        let call_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "call_latency_seconds",
                "Time to verify, apply and persist one signed call",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 1.0]),
        )?;
        registry.register(Box::new(call_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            calls_accepted_total,
            calls_rejected_total,
            contributions_total,
            withdrawals_total,
            refunds_total,
            current_slot,
            open_campaigns,
            call_latency_seconds,
        })
    }

    /// Count an accepted call and the transitions it caused.
    pub fn record(&self, receipt: &Receipt) {
        self.calls_accepted_total.inc();
        for event in &receipt.events {
            match event {
                CampaignEvent::Contributed { .. } => self.contributions_total.inc(),
                CampaignEvent::Withdrawn { .. } => self.withdrawals_total.inc(),
                CampaignEvent::Refunded { .. } => self.refunds_total.inc(),
                _ => {}
            }
        }
    }

    /// Count a rejected call. Ledger violations are labelled by their class.
    pub fn record_rejection(&self, kind: Option<ErrorKind>) {
        let reason = kind.map_or_else(|| "call".to_string(), |k| k.to_string());
        self.calls_rejected_total.with_label_values(&[reason.as_str()]).inc();
    }

    /// Prometheus text exposition of everything registered.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

pub type SharedMetrics = Arc<NodeMetrics>;

/// `GET /metrics`
pub async fn metrics_handler(State(metrics): State<SharedMetrics>) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
