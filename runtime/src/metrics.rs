//! Prometheus metrics for the client runtime.
//!
//! The query client and the store emit counters and histograms through the
//! `metrics` facade. Nothing is recorded until a recorder is installed; the
//! demo installs [`MetricsRecorder`] and renders a snapshot on exit.
//!
//! # Example
//!
//! ```rust,no_run
//! use graphql_todo_runtime::metrics::MetricsRecorder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let recorder = MetricsRecorder::install()?;
//! // ... run the client ...
//! if let Some(snapshot) = recorder.render() {
//!     println!("{snapshot}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

pub use metrics::{counter, histogram};

/// Recorder setup failures
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Histogram bucket configuration was rejected
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// The global recorder could not be set
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Process-wide Prometheus recorder.
///
/// Holds the handle used to render the text exposition format. No HTTP
/// listener is started.
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl MetricsRecorder {
    /// Describe all metrics and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Build`] if the histogram buckets are rejected and
    /// [`MetricsError::Install`] if installation fails for any reason other
    /// than a recorder already being present.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., in tests), the returned
    /// recorder has no handle and [`MetricsRecorder::render`] yields `None`.
    pub fn install() -> Result<Self, MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.000_01, 0.000_1, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                tracing::info!("Metrics recorder installed");
                Ok(Self { handle: Some(handle) })
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("A metrics recorder is already installed, reusing it");
                    Ok(Self { handle: None })
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Get the Prometheus handle, if this recorder owns one.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

impl std::fmt::Debug for MetricsRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRecorder")
            .field("installed", &self.handle.is_some())
            .finish()
    }
}

/// Describe every client and store metric to the installed recorder
pub fn register_metrics() {
    // Query client
    describe_counter!(
        "client.operations.total",
        "GraphQL operations sent to the transport, labelled by operation"
    );
    describe_counter!(
        "client.operations.failed",
        "GraphQL operations that ended in a transport or server error"
    );
    describe_counter!("client.cache.hits", "Queries answered from the response cache");
    describe_counter!("client.cache.misses", "Queries that had to go to the network");
    describe_counter!(
        "client.cache.updates",
        "Update callbacks run after successful mutations; mutations without one are not counted"
    );
    describe_counter!(
        "client.cache.patches",
        "Cached lists rewritten by a mutation result, labelled by mutation"
    );

    // Store
    describe_counter!("store.actions.total", "Actions reduced by the store");
    describe_counter!(
        "store.effects.executed",
        "Effects executed by the store, labelled by effect type"
    );
    describe_counter!(
        "store.shutdown.rejected_actions",
        "Actions rejected because the store was shutting down"
    );
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time taken to run the reducer for one action"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn install_is_idempotent() {
        let first = MetricsRecorder::install().unwrap();
        let second = MetricsRecorder::install().unwrap();
        // At most one recorder owns the global handle
        assert!(!(first.handle().is_some() && second.handle().is_some()));
    }

    #[test]
    fn render_reports_recorded_counters() {
        let recorder = MetricsRecorder::install().unwrap();
        counter!("store.actions.total").increment(1);
        if let Some(snapshot) = recorder.render() {
            assert!(snapshot.contains("store_actions_total"));
        }
    }
}
