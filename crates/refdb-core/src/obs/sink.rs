//! Metrics sink boundary.
//!
//! All instrumentation flows through MetricsEvent and MetricsSink.

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    TreeBuilt {
        nodes: u64,
    },
    DeleteAnalyzed {
        support_set: u64,
        graph_nodes: u64,
    },
    DeleteRejected,
    DeleteUnsupported,
    DeleteUnauthorized,
    DeleteConflict,
    DeleteCommitted {
        records: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink: Send + Sync {
    fn record(&self, event: MetricsEvent);
}

///
/// NoopMetricsSink
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn record(&self, _: MetricsEvent) {}
}

/// Shared sink for callers that do not collect metrics.
pub static NOOP_SINK: NoopMetricsSink = NoopMetricsSink;
