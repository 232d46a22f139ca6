//! Prometheus metrics for the kitchen simulation.
//!
//! Recording goes through the `metrics` facade and costs nothing until a
//! recorder is installed. [`MetricsServer`] installs the Prometheus recorder
//! and serves the scrape endpoint.
//!
//! - Order lifecycle: received, started, completed and skipped orders
//! - Kitchen load: busy cooks and queued item units
//! - Executor: events processed
//! - Persistence: order sink write latency
//!
//! # Example
//!
//! ```rust,no_run
//! use kitchen_sim_runtime::metrics::MetricsServer;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = MetricsServer::new("0.0.0.0:9090".parse()?);
//! server.start()?;
//! // Metrics available at http://localhost:9090/metrics
//! # Ok(())
//! # }
//! ```

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus metrics server.
///
/// Exposes metrics on an HTTP endpoint for Prometheus scraping.
pub struct MetricsServer {
    addr: SocketAddr,
    handle: Option<PrometheusHandle>,
}

impl MetricsServer {
    /// Create a new metrics server.
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self { addr, handle: None }
    }

    /// Install the Prometheus recorder and start serving `/metrics`.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the exporter cannot be built or bound. A recorder
    /// that is already installed is not an error: a warning is logged and the
    /// existing recorder keeps collecting.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        let (recorder, exporter) = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?
            .with_http_listener(self.addr)
            .build()
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        let handle = recorder.handle();
        match metrics::set_global_recorder(recorder) {
            Ok(()) => {
                self.handle = Some(handle);
                tokio::spawn(async move {
                    // ExporterError implements neither Debug nor Display
                    if exporter.await.is_err() {
                        tracing::error!("Metrics exporter stopped");
                    }
                });
                tracing::info!(addr = %self.addr, "Metrics available at http://{}/metrics", self.addr);
                Ok(())
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this server did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!("kitchen_orders_received_total", "Orders that arrived and were queued");
    describe_counter!(
        "kitchen_orders_started_total",
        "Orders that had their first item handed to a cook"
    );
    describe_counter!("kitchen_orders_completed_total", "Orders with every item cooked");
    describe_counter!(
        "kitchen_orders_skipped_total",
        "Orders dropped before the run because they contain no item units"
    );
    describe_counter!("kitchen_items_cooked_total", "Item units finished by a cook");
    describe_gauge!("kitchen_cooks_busy", "Cooks currently working on an item");
    describe_gauge!("kitchen_queue_depth", "Item units waiting for a cook");
    describe_counter!(
        "simulation_events_processed_total",
        "Scheduled events dispatched by the executor"
    );
    describe_histogram!(
        "order_sink_write_duration_seconds",
        "Wall time taken to persist one lifecycle transition"
    );
    describe_counter!(
        "order_sink_writes_total",
        "Rows written by the database order sink, labelled by resulting status"
    );
    describe_counter!("retry_attempts_total", "Total number of retry attempts");
    describe_counter!("retry_successes_total", "Operations that succeeded after retrying");
    describe_counter!("retry_exhausted_total", "Operations that ran out of retries");
}

/// Order lifecycle and kitchen load recorder.
pub struct KitchenMetrics;

impl KitchenMetrics {
    /// Record an order arrival.
    pub fn record_received() {
        counter!("kitchen_orders_received_total").increment(1);
    }

    /// Record an order's first cook grant.
    pub fn record_started() {
        counter!("kitchen_orders_started_total").increment(1);
    }

    /// Record an order completion.
    pub fn record_completed() {
        counter!("kitchen_orders_completed_total").increment(1);
    }

    /// Record an order dropped during setup.
    pub fn record_skipped() {
        counter!("kitchen_orders_skipped_total").increment(1);
    }

    /// Record one finished item unit.
    pub fn record_item_cooked() {
        counter!("kitchen_items_cooked_total").increment(1);
    }

    /// Record current kitchen load.
    #[allow(clippy::cast_precision_loss)] // cook and queue counts are small
    pub fn record_load(cooks_busy: usize, queue_depth: usize) {
        gauge!("kitchen_cooks_busy").set(cooks_busy as f64);
        gauge!("kitchen_queue_depth").set(queue_depth as f64);
    }
}

/// Executor and persistence recorder.
pub struct SimulationMetrics;

impl SimulationMetrics {
    /// Record one dispatched event.
    pub fn record_event() {
        counter!("simulation_events_processed_total").increment(1);
    }

    /// Record a completed sink write.
    pub fn record_sink_write(duration: Duration) {
        histogram!("order_sink_write_duration_seconds").record(duration.as_secs_f64());
    }
}

/// Retry metrics recorder.
pub struct RetryMetrics;

impl RetryMetrics {
    /// Record a retry attempt.
    pub fn record_attempt() {
        counter!("retry_attempts_total").increment(1);
    }

    /// Record a successful retry.
    pub fn record_success() {
        counter!("retry_successes_total").increment(1);
    }

    /// Record exhausted retries.
    pub fn record_exhausted() {
        counter!("retry_exhausted_total").increment(1);
    }
}
