use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);

    metrics::describe_counter!("attempts_started_total", "Attempts started");
    metrics::describe_counter!("attempts_finalized_total", "Attempts finalized, by terminal status");
    metrics::describe_counter!("answers_saved_total", "Answer upserts accepted");
    metrics::describe_counter!("timer_expirations_total", "Timer registrations that fired");
    metrics::describe_counter!("expired_attempts_closed_total", "Attempts closed by the catch-up sweep");
    metrics::describe_counter!("expiry_failures_total", "Expired attempts that failed to auto-submit");
    metrics::describe_gauge!("active_timers", "Attempts currently tracked by the timer registry");
    metrics::describe_counter!("http_requests_total", "HTTP responses, by status");
    metrics::describe_histogram!("http_request_duration_seconds", "HTTP request latency");

    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}
