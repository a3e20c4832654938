use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Build the Prometheus recorder and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
///
/// Only the first call installs the global recorder; later calls (several
/// routers in one test binary) get a working handle that renders nothing.
pub fn init_metrics() -> PrometheusHandle {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    if metrics::set_global_recorder(recorder).is_err() {
        tracing::debug!("Prometheus recorder already installed");
        return handle;
    }

    // Pre-register counters so they appear even before the first increment.
    counter!("signals_published").absolute(0);
    counter!("signals_rejected").absolute(0);
    counter!("copy_trades_created").absolute(0);
    counter!("copy_trades_rejected").absolute(0);
    counter!("auto_copy_dispatched").absolute(0);

    // Histogram is lazily created on first record; force creation.
    histogram!("copy_decision_seconds").record(0.0);

    handle
}
