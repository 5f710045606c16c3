//! Observability boundary.
//!
//! Engine code reports through [`MetricsEvent`] and a [`MetricsSink`]; it
//! never touches counters directly. Structured logs go through `tracing`.

pub mod metrics;
pub mod sink;

pub use metrics::{CounterMetricsSink, ReferenceMetrics};
pub use sink::{MetricsEvent, MetricsSink, NOOP_SINK, NoopMetricsSink};
