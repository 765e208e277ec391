//! Metrics setup and update for query execution.

use std::time::Duration;

use prometheus::core::{AtomicU64, GenericCounter};
use prometheus::Histogram;

use crate::error::Error;

#[derive(Debug, Clone)]
pub struct Metrics {
    pub query_total: GenericCounter<AtomicU64>,
    pub explain_total: GenericCounter<AtomicU64>,
    pub error_total: GenericCounter<AtomicU64>,
    pub query_execution_time: Histogram,
}

impl Metrics {
    /// Set up counters and histograms used to produce Prometheus metrics.
    pub fn initialize(metrics_registry: &mut prometheus::Registry) -> Result<Self, Error> {
        let query_total = add_int_counter_metric(
            metrics_registry,
            "lazy_query_query_total",
            "Total successful queries.",
        )?;

        let explain_total = add_int_counter_metric(
            metrics_registry,
            "lazy_query_explain_total",
            "Total successful explains.",
        )?;

        let error_total = add_int_counter_metric(
            metrics_registry,
            "lazy_query_error_total",
            "Total queries that failed in the database.",
        )?;

        let query_execution_time = add_histogram_metric(
            metrics_registry,
            "lazy_query_query_execution_time",
            "Time taken to execute a query and fetch its rows, in seconds.",
        )?;

        Ok(Metrics {
            query_total,
            explain_total,
            error_total,
            query_execution_time,
        })
    }

    pub fn record_successful_query(&self) {
        self.query_total.inc();
    }

    pub fn record_successful_explain(&self) {
        self.explain_total.inc();
    }

    pub fn record_error(&self) {
        self.error_total.inc();
    }

    pub fn record_query_execution_time(&self, duration: Duration) {
        self.query_execution_time.observe(duration.as_secs_f64());
    }
}

/// Create a new int counter metric and register it with the provided Prometheus Registry
fn add_int_counter_metric(
    metrics_registry: &mut prometheus::Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<GenericCounter<AtomicU64>, Error> {
    let int_counter =
        prometheus::IntCounter::with_opts(prometheus::Opts::new(metric_name, metric_description))?;
    metrics_registry.register(Box::new(int_counter.clone()))?;
    Ok(int_counter)
}

/// Create a new histogram metric and register it with the provided Prometheus Registry
fn add_histogram_metric(
    metrics_registry: &mut prometheus::Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<Histogram, Error> {
    let histogram = Histogram::with_opts(prometheus::HistogramOpts::new(
        metric_name,
        metric_description,
    ))?;
    metrics_registry.register(Box::new(histogram.clone()))?;
    Ok(histogram)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_are_registered_once() {
        let mut registry = prometheus::Registry::new();
        let metrics = Metrics::initialize(&mut registry).unwrap();
        metrics.record_successful_query();
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"lazy_query_query_total".to_string()));
        assert!(names.contains(&"lazy_query_query_execution_time".to_string()));
        assert!(matches!(
            Metrics::initialize(&mut registry),
            Err(Error::Metrics(_))
        ));
    }
}
