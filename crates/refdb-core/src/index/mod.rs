use crate::{
    error::InternalError,
    model::{Record, RecordRef, StoredRecord},
    store::RecordStore,
};
use std::collections::BTreeSet;

///
/// ReferenceIndex
///
/// Read-only view of who points at whom, always answered from the store's
/// current committed state.
///

pub struct ReferenceIndex<'a, S: RecordStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: RecordStore + ?Sized> ReferenceIndex<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Load a record or fail with `NotFound`.
    pub fn record(&self, key: &RecordRef) -> Result<StoredRecord, InternalError> {
        self.store
            .get(key)?
            .ok_or_else(|| InternalError::store_not_found(key.to_string()))
    }

    /// Records `key` points to.
    pub fn outgoing_of(&self, key: &RecordRef) -> Result<BTreeSet<RecordRef>, InternalError> {
        let stored = self.record(key)?;

        self.resolve_outgoing(&stored.record)
    }

    /// Records pointing at `key`.
    pub fn incoming_of(&self, key: &RecordRef) -> Result<BTreeSet<RecordRef>, InternalError> {
        self.record(key)?;

        self.referencers(key)
    }

    // Resolve reference candidates of an already-loaded record to the
    // records that currently exist.
    pub(crate) fn resolve_outgoing(
        &self,
        record: &Record,
    ) -> Result<BTreeSet<RecordRef>, InternalError> {
        let mut targets = BTreeSet::new();
        for (_, candidate) in record.reference_candidates() {
            if !targets.contains(&candidate) && self.store.contains(&candidate)? {
                targets.insert(candidate);
            }
        }

        Ok(targets)
    }

    // Reverse lookup without the existence check on `key`.
    pub(crate) fn referencers(&self, key: &RecordRef) -> Result<BTreeSet<RecordRef>, InternalError> {
        Ok(self
            .store
            .referenced_by(key)?
            .into_iter()
            .map(|edge| edge.from)
            .collect())
    }
}

///
/// TESTS
///
