//! Two-phase cascading delete.
//!
//! `prepare` analyzes and authorizes without touching the store; `commit`
//! re-validates the prepared support set and hands it to the store's atomic
//! batch delete. Any change observed between the two phases surfaces as a
//! retryable conflict and nothing is removed.


use crate::{
    analyze::{DeleteDecision, ExclusivityAnalyzer, SupportSet},
    auth::{AuthDecision, AuthorizationGate, Credentials},
    config::DeleteConfig,
    error::{ErrorClass, InternalError},
    index::ReferenceIndex,
    model::{RecordRef, Revision},
    obs::{MetricsEvent, MetricsSink},
    store::{DeleteBatch, DeleteReceipt, RecordStore},
};
use tracing::{debug, info, warn};

///
/// PreparedDelete
///
/// An approved and authorized support set, pinned to the revisions read
/// during analysis. Only `commit` consumes it.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PreparedDelete {
    roots: Vec<RecordRef>,
    support: SupportSet,
}

impl PreparedDelete {
    #[must_use]
    pub fn roots(&self) -> &[RecordRef] {
        &self.roots
    }

    #[must_use]
    pub const fn support(&self) -> &SupportSet {
        &self.support
    }
}

///
/// Prepared
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Prepared {
    /// Ready to commit.
    Ready(PreparedDelete),

    /// Analysis or authorization already settled the request.
    Decided(DeleteDecision),
}

///
/// CascadeDeleteExecutor
///

pub struct CascadeDeleteExecutor<'a, S: RecordStore + ?Sized, G: AuthorizationGate + ?Sized> {
    store: &'a S,
    gate: &'a G,
    config: &'a DeleteConfig,
    metrics: &'a dyn MetricsSink,
}

impl<'a, S, G> CascadeDeleteExecutor<'a, S, G>
where
    S: RecordStore + ?Sized,
    G: AuthorizationGate + ?Sized,
{
    #[must_use]
    pub const fn new(
        store: &'a S,
        gate: &'a G,
        config: &'a DeleteConfig,
        metrics: &'a dyn MetricsSink,
    ) -> Self {
        Self {
            store,
            gate,
            config,
            metrics,
        }
    }

    /// Prepare and commit in one call.
    pub fn execute(
        &self,
        roots: &[RecordRef],
        credentials: &Credentials,
    ) -> Result<DeleteDecision, InternalError> {
        match self.prepare(roots, credentials)? {
            Prepared::Ready(prepared) => self.commit(prepared),
            Prepared::Decided(decision) => Ok(decision),
        }
    }

    /// Analyze `roots` and authorize every support set member.
    pub fn prepare(
        &self,
        roots: &[RecordRef],
        credentials: &Credentials,
    ) -> Result<Prepared, InternalError> {
        if roots.is_empty() {
            return Err(InternalError::executor_invariant(
                "cascading delete needs at least one root",
            ));
        }

        let mut analyzer = ExclusivityAnalyzer::new(self.store, self.config.max_support_set);
        let decision = match analyzer.analyze_all(roots) {
            Ok(decision) => decision,
            Err(err) => {
                if err.class == ErrorClass::Unsupported {
                    self.metrics.record(MetricsEvent::DeleteUnsupported);
                }
                return Err(err);
            }
        };

        let support = match decision {
            DeleteDecision::Approved(support) => support,
            DeleteDecision::Rejected(rejection) => {
                self.metrics.record(MetricsEvent::DeleteRejected);
                return Ok(Prepared::Decided(DeleteDecision::Rejected(rejection)));
            }
            DeleteDecision::UnsupportedObjectType(object_type) => {
                self.metrics.record(MetricsEvent::DeleteUnsupported);
                return Ok(Prepared::Decided(DeleteDecision::UnsupportedObjectType(
                    object_type,
                )));
            }
            DeleteDecision::Unauthorized => {
                return Err(InternalError::executor_invariant(
                    "analysis returned an authorization decision",
                ));
            }
        };

        self.metrics.record(MetricsEvent::DeleteAnalyzed {
            support_set: u64::try_from(support.len()).unwrap_or(u64::MAX),
            graph_nodes: u64::try_from(analyzer.graph_len()).unwrap_or(u64::MAX),
        });

        for (key, revision) in &support {
            let Some(stored) = self.store.get(key)? else {
                return Err(self.conflict(InternalError::revalidation_conflict(
                    key.to_string(),
                    "record vanished",
                )));
            };
            if stored.revision != *revision {
                return Err(self.conflict(InternalError::revalidation_conflict(
                    key.to_string(),
                    format!("revision changed from {revision} to {}", stored.revision),
                )));
            }

            if let AuthDecision::Denied(reason) = self.gate.authorize(&stored.record, credentials)? {
                // A maintainer removed by a concurrent delete of this very set
                // is a conflict, not a denial.
                if !self.unchanged(key, *revision)? {
                    return Err(self.conflict(InternalError::revalidation_conflict(
                        key.to_string(),
                        "record changed during authorization",
                    )));
                }

                // The reason stays in the logs; callers only learn the denial.
                debug!(%key, %reason, "cascading delete not authorized");
                self.metrics.record(MetricsEvent::DeleteUnauthorized);

                return Ok(Prepared::Decided(DeleteDecision::Unauthorized));
            }
        }

        Ok(Prepared::Ready(PreparedDelete {
            roots: roots.to_vec(),
            support,
        }))
    }

    /// Re-validate and atomically remove a prepared support set.
    pub fn commit(&self, prepared: PreparedDelete) -> Result<DeleteDecision, InternalError> {
        let PreparedDelete { roots, support } = prepared;
        if support.is_empty() {
            return Err(InternalError::executor_invariant(
                "prepared delete has an empty support set",
            ));
        }

        if self.config.revalidate {
            self.revalidate(&support).map_err(|err| self.conflict(err))?;
        }

        let batch = DeleteBatch::new(support.clone().into_members());
        let DeleteReceipt { commit_id, removed } = self
            .store
            .commit_delete(&batch)
            .map_err(|err| self.conflict(err))?;

        self.metrics.record(MetricsEvent::DeleteCommitted {
            records: u64::try_from(removed.len()).unwrap_or(u64::MAX),
        });
        info!(
            %commit_id,
            roots = ?roots,
            records = removed.len(),
            "cascading delete committed"
        );

        Ok(DeleteDecision::Approved(support))
    }

    // Every member still at its analyzed revision, and every referencer
    // still inside the set.
    fn revalidate(&self, support: &SupportSet) -> Result<(), InternalError> {
        let index = ReferenceIndex::new(self.store);

        for (key, revision) in support {
            let current = self.store.get(key)?.ok_or_else(|| {
                InternalError::revalidation_conflict(key.to_string(), "record vanished")
            })?;
            if current.revision != *revision {
                return Err(InternalError::revalidation_conflict(
                    key.to_string(),
                    format!("revision changed from {revision} to {}", current.revision),
                ));
            }

            if let Some(outside) = index
                .referencers(key)?
                .into_iter()
                .find(|source| !support.contains(source))
            {
                return Err(InternalError::revalidation_conflict(
                    key.to_string(),
                    format!("now referenced by {outside}"),
                ));
            }
        }

        Ok(())
    }

    fn unchanged(&self, key: &RecordRef, revision: Revision) -> Result<bool, InternalError> {
        Ok(self
            .store
            .get(key)?
            .is_some_and(|current| current.revision == revision))
    }

    // Count and log conflicts on their way out.
    fn conflict(&self, err: InternalError) -> InternalError {
        if err.is_conflict() {
            self.metrics.record(MetricsEvent::DeleteConflict);
            warn!(error = %err, "cascading delete conflicted; nothing was removed");
        }

        err
    }
}
