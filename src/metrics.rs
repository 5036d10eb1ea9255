use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

use crate::pipeline::{Estimate, PipelineError};

/// Install the Prometheus recorder and describe all metrics.
pub fn init_metrics(model_kind: &str) -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    init_metric_descriptions(model_kind);

    Ok(handle)
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions(model_kind: &str) {
    describe_counter!("quote_requests_total", "Total number of quote computations");
    describe_counter!("quote_errors_total", "Total number of failed quote computations");
    describe_histogram!(
        "quote_duration_seconds",
        "Time spent encoding and predicting a quote"
    );
    describe_gauge!("plan_cost_info", "Service version and loaded model kind");

    gauge!(
        "plan_cost_info",
        "version" => env!("CARGO_PKG_VERSION"),
        "model_kind" => model_kind.to_string(),
    )
    .set(1.0);
}

/// Record the outcome of one pipeline run.
pub fn record_quote(result: &Result<Estimate, PipelineError>, duration: Duration) {
    let outcome = if result.is_ok() { "success" } else { "error" };
    counter!("quote_requests_total", "outcome" => outcome).increment(1);
    histogram!("quote_duration_seconds").record(duration.as_secs_f64());

    if let Err(e) = result {
        counter!("quote_errors_total", "error_type" => e.error_type()).increment(1);
    }
}
