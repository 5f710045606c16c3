use crate::obs::sink::{MetricsEvent, MetricsSink};
use candid::CandidType;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

///
/// ReferenceMetrics
/// Point-in-time snapshot of reference read / cascading delete counters.
///

#[derive(CandidType, Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ReferenceMetrics {
    // Read path
    pub trees_built: u64,
    pub tree_nodes: u64,

    // Delete path outcomes
    pub deletes_analyzed: u64,
    pub support_set_records: u64,
    pub deletes_rejected: u64,
    pub deletes_unsupported: u64,
    pub deletes_unauthorized: u64,
    pub delete_conflicts: u64,
    pub deletes_committed: u64,
    pub records_deleted: u64,

    // Work
    pub graph_nodes_loaded: u64,
}

///
/// CounterMetricsSink
/// Lock-free counters shared by concurrent requests.
///

#[derive(Debug, Default)]
pub struct CounterMetricsSink {
    trees_built: AtomicU64,
    tree_nodes: AtomicU64,
    deletes_analyzed: AtomicU64,
    support_set_records: AtomicU64,
    deletes_rejected: AtomicU64,
    deletes_unsupported: AtomicU64,
    deletes_unauthorized: AtomicU64,
    delete_conflicts: AtomicU64,
    deletes_committed: AtomicU64,
    records_deleted: AtomicU64,
    graph_nodes_loaded: AtomicU64,
}

impl CounterMetricsSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn snapshot(&self) -> ReferenceMetrics {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);

        ReferenceMetrics {
            trees_built: load(&self.trees_built),
            tree_nodes: load(&self.tree_nodes),
            deletes_analyzed: load(&self.deletes_analyzed),
            support_set_records: load(&self.support_set_records),
            deletes_rejected: load(&self.deletes_rejected),
            deletes_unsupported: load(&self.deletes_unsupported),
            deletes_unauthorized: load(&self.deletes_unauthorized),
            delete_conflicts: load(&self.delete_conflicts),
            deletes_committed: load(&self.deletes_committed),
            records_deleted: load(&self.records_deleted),
            graph_nodes_loaded: load(&self.graph_nodes_loaded),
        }
    }
}

impl MetricsSink for CounterMetricsSink {
    fn record(&self, event: MetricsEvent) {
        let bump = |counter: &AtomicU64, by: u64| {
            counter.fetch_add(by, Ordering::Relaxed);
        };

        match event {
            MetricsEvent::TreeBuilt { nodes } => {
                bump(&self.trees_built, 1);
                bump(&self.tree_nodes, nodes);
            }
            MetricsEvent::DeleteAnalyzed {
                support_set,
                graph_nodes,
            } => {
                bump(&self.deletes_analyzed, 1);
                bump(&self.support_set_records, support_set);
                bump(&self.graph_nodes_loaded, graph_nodes);
            }
            MetricsEvent::DeleteRejected => bump(&self.deletes_rejected, 1),
            MetricsEvent::DeleteUnsupported => bump(&self.deletes_unsupported, 1),
            MetricsEvent::DeleteUnauthorized => bump(&self.deletes_unauthorized, 1),
            MetricsEvent::DeleteConflict => bump(&self.delete_conflicts, 1),
            MetricsEvent::DeleteCommitted { records } => {
                bump(&self.deletes_committed, 1);
                bump(&self.records_deleted, records);
            }
        }
    }
}

///
/// TESTS
///
