//! Prometheus metrics for the promotion dispatcher.
//!
//! Exposes:
//! - `promo_dispatch_cycles_total` (counter by outcome)
//! - `promo_dispatch_command_duration_seconds` (histogram by command)
//!
//! The dispatcher is a short-lived job, so metrics are written to a file in
//! the text exposition format for the node_exporter textfile collector
//! instead of being served.

use std::fs;
use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};
use tracing::debug;

use crate::dispatch::DispatchOutcome;
use crate::Result;

static CYCLES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "promo_dispatch_cycles_total",
        "Dispatch cycles by outcome",
        &["outcome"]
    )
    .expect("failed to register cycle counter")
});

static COMMAND_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    // Exponential buckets from 50ms up to ~3 minutes.
    let buckets =
        prometheus::exponential_buckets(0.05, 2.0, 12).expect("failed to create histogram buckets");
    register_histogram_vec!(
        "promo_dispatch_command_duration_seconds",
        "CLI command duration in seconds",
        &["command"],
        buckets
    )
    .expect("failed to register command duration histogram")
});

/// Count one finished dispatch cycle.
pub fn record_cycle(outcome: DispatchOutcome) {
    CYCLES_TOTAL.with_label_values(&[outcome.as_str()]).inc();
}

/// Count a cycle that could not read the catalog.
pub fn record_source_unavailable() {
    CYCLES_TOTAL.with_label_values(&["source_unavailable"]).inc();
}

pub fn record_command_duration(command: &'static str, duration: Duration) {
    COMMAND_DURATION
        .with_label_values(&[command])
        .observe(duration.as_secs_f64());
}

/// Encode all registered metrics in the text exposition format.
pub fn render() -> Result<String> {
    Lazy::force(&CYCLES_TOTAL);
    Lazy::force(&COMMAND_DURATION);

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| crate::Error::SerializationError(format!("failed to encode metrics: {}", e)))?;
    String::from_utf8(buffer)
        .map_err(|e| crate::Error::SerializationError(format!("metrics are not UTF-8: {}", e)))
}

/// Write metrics atomically (temp file + rename) so the collector never
/// reads a half-written file.
pub fn write_textfile(path: &Path) -> Result<()> {
    let body = render()?;
    let tmp = path.with_extension("prom.tmp");
    fs::write(&tmp, body)?;
    fs::rename(&tmp, path)?;
    debug!(path = %path.display(), "Metrics written");
    Ok(())
}
