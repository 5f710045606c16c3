use crate::{
    analyze::DeleteDecision,
    auth::{AuthorizationGate, Credentials},
    config::RegistryConfig,
    error::InternalError,
    executor::CascadeDeleteExecutor,
    model::RecordRef,
    obs::{MetricsSink, NOOP_SINK},
    store::RecordStore,
    tree::{ReferenceTreeNode, TreeBuilder},
};
use tracing::debug_span;

///
/// RegistrySession
///
/// Request entrypoint binding a store, an authorization gate, config and a
/// metrics sink. Validates raw request fields (source, then object type,
/// then primary key) before any traversal.
///

pub struct RegistrySession<'a, S: RecordStore + ?Sized, G: AuthorizationGate + ?Sized> {
    store: &'a S,
    gate: &'a G,
    config: &'a RegistryConfig,
    metrics: &'a dyn MetricsSink,
}

impl<'a, S, G> RegistrySession<'a, S, G>
where
    S: RecordStore + ?Sized,
    G: AuthorizationGate + ?Sized,
{
    #[must_use]
    pub fn new(store: &'a S, gate: &'a G, config: &'a RegistryConfig) -> Self {
        Self {
            store,
            gate,
            config,
            metrics: &NOOP_SINK,
        }
    }

    #[must_use]
    pub const fn with_metrics(mut self, metrics: &'a dyn MetricsSink) -> Self {
        self.metrics = metrics;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &RegistryConfig {
        self.config
    }

    /// Reference tree of one record.
    pub fn reference_tree(
        &self,
        source: &str,
        object_type: &str,
        primary_key: &str,
    ) -> Result<ReferenceTreeNode, InternalError> {
        let _span = debug_span!("reference_tree", source, object_type, primary_key).entered();
        let root = self.parse_request(source, object_type, primary_key)?;

        TreeBuilder::new(self.store, &self.config.tree).build(&root, self.metrics)
    }

    /// Cascading delete of one record and everything only it keeps alive.
    pub fn delete_references(
        &self,
        source: &str,
        object_type: &str,
        primary_key: &str,
        credentials: &Credentials,
    ) -> Result<DeleteDecision, InternalError> {
        let _span = debug_span!("delete_references", source, object_type, primary_key).entered();
        let root = self.parse_request(source, object_type, primary_key)?;

        self.executor().execute(&[root], credentials)
    }

    /// Cascading delete of several roots as one atomic batch.
    pub fn delete_many(
        &self,
        source: &str,
        roots: &[(&str, &str)],
        credentials: &Credentials,
    ) -> Result<DeleteDecision, InternalError> {
        let _span = debug_span!("delete_many", source, roots = roots.len()).entered();
        self.config.check_source(source)?;
        let roots = roots
            .iter()
            .map(|(object_type, primary_key)| RecordRef::parse(object_type, primary_key))
            .collect::<Result<Vec<_>, _>>()?;

        self.executor().execute(&roots, credentials)
    }

    /// Executor for callers driving prepare and commit themselves.
    #[must_use]
    pub const fn executor(&self) -> CascadeDeleteExecutor<'a, S, G> {
        CascadeDeleteExecutor::new(self.store, self.gate, &self.config.delete, self.metrics)
    }

    fn parse_request(
        &self,
        source: &str,
        object_type: &str,
        primary_key: &str,
    ) -> Result<RecordRef, InternalError> {
        self.config.check_source(source)?;

        Ok(RecordRef::parse(object_type, primary_key)?)
    }
}

///
/// TESTS
///
