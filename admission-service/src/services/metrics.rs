use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn init_metrics() {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if METRICS_HANDLE.set(handle).is_err() {
        tracing::warn!("metrics recorder already initialized");
    }
}

pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Record a created admission.
pub fn record_admission(branch_id: &str) {
    metrics::counter!("admissions_created_total", "branch_id" => branch_id.to_string())
        .increment(1);
}

/// Record a verified payment amount (in paise, for integer counters).
pub fn record_payment(method: &str, amount_paise: u64) {
    metrics::counter!("payments_verified_total", "method" => method.to_string()).increment(1);
    metrics::counter!("payment_amount_paise_total", "method" => method.to_string())
        .increment(amount_paise);
}
