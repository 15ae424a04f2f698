use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static INVOICES_SAVED_TOTAL: OnceLock<IntCounter> = OnceLock::new();
pub static INVOICE_SAVE_FAILURES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static INVOICE_EXPORTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Install the HTTP metrics recorder and register the invoice counters.
///
/// Calling this twice is an error; the recorder is process-global.
pub fn init_metrics() -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;
    METRICS_HANDLE
        .set(handle)
        .map_err(|_| anyhow::anyhow!("Metrics recorder already initialized"))?;

    let registry = Registry::new();

    let saved = IntCounter::new("invoices_saved_total", "Bills accepted by the bill store")?;
    let failures = IntCounterVec::new(
        Opts::new(
            "invoice_save_failures_total",
            "Save attempts that did not reach the bill store, by reason",
        ),
        &["reason"],
    )?;
    let exports = IntCounterVec::new(
        Opts::new("invoice_exports_total", "Invoice image exports by outcome"),
        &["outcome"],
    )?;

    registry.register(Box::new(saved.clone()))?;
    registry.register(Box::new(failures.clone()))?;
    registry.register(Box::new(exports.clone()))?;

    let _ = PROMETHEUS_REGISTRY.set(registry);
    let _ = INVOICES_SAVED_TOTAL.set(saved);
    let _ = INVOICE_SAVE_FAILURES_TOTAL.set(failures);
    let _ = INVOICE_EXPORTS_TOTAL.set(exports);

    Ok(())
}

pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
            tracing::warn!(error = %e, "Failed to encode invoice metrics");
        }
        if let Ok(custom) = String::from_utf8(buffer) {
            output.push_str(&custom);
        }
    }

    output
}

pub fn record_invoice_saved() {
    if let Some(counter) = INVOICES_SAVED_TOTAL.get() {
        counter.inc();
    }
}

/// `reason` is one of `validation`, `remote`, `busy`.
pub fn record_save_failure(reason: &str) {
    if let Some(counter) = INVOICE_SAVE_FAILURES_TOTAL.get() {
        counter.with_label_values(&[reason]).inc();
    }
}

/// `outcome` is `success` or `failure`.
pub fn record_export(outcome: &str) {
    if let Some(counter) = INVOICE_EXPORTS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_before_init_is_a_no_op() {
        record_invoice_saved();
        record_save_failure("remote");
        record_export("success");
    }
}
