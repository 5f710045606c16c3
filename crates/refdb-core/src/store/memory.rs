use super::{DeleteBatch, DeleteReceipt, RecordStore, guard::DeleteApplyGuard};
use crate::{
    error::InternalError,
    model::{AttributeType, Record, RecordRef, ReferenceEdge, Revision, StoredRecord},
};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

///
/// MemoryStore
///
/// In-memory record store with a reverse reference index.
///
/// The reverse index is keyed by every record a value *could* resolve to
/// (a contact slot names both the person and the role with that key), so
/// records can be written in any order and still resolve once their
/// targets appear.
///

#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
pub(super) struct MemoryState {
    records: BTreeMap<RecordRef, StoredRecord>,
    referrers: BTreeMap<RecordRef, BTreeMap<RecordRef, BTreeSet<AttributeType>>>,
    last_revision: u64,
}

impl MemoryState {
    fn link(&mut self, record: &Record) {
        for (slot, target) in record.reference_candidates() {
            self.referrers
                .entry(target)
                .or_default()
                .entry(record.key.clone())
                .or_default()
                .insert(slot);
        }
    }

    fn unlink(&mut self, record: &Record) {
        for (_, target) in record.reference_candidates() {
            let Some(sources) = self.referrers.get_mut(&target) else {
                continue;
            };
            sources.remove(&record.key);
            if sources.is_empty() {
                self.referrers.remove(&target);
            }
        }
    }

    fn write(&mut self, record: Record) -> Revision {
        if let Some(previous) = self.records.remove(&record.key) {
            self.unlink(&previous.record);
        }

        self.last_revision += 1;
        let revision = Revision(self.last_revision);
        self.link(&record);
        self.records
            .insert(record.key.clone(), StoredRecord { record, revision });

        revision
    }

    pub(super) fn take(&mut self, key: &RecordRef) -> Option<StoredRecord> {
        let stored = self.records.remove(key)?;
        self.unlink(&stored.record);

        Some(stored)
    }

    // Reinstate a row exactly as it was, revision included.
    pub(super) fn restore(&mut self, stored: StoredRecord) {
        self.link(&stored.record);
        self.records.insert(stored.record.key.clone(), stored);
    }

    fn live_referrers(&self, key: &RecordRef) -> impl Iterator<Item = (&RecordRef, &BTreeSet<AttributeType>)> {
        self.referrers
            .get(key)
            .into_iter()
            .flatten()
            .filter(|(from, _)| self.records.contains_key(*from))
    }

    // Phase 1 of a batch delete: every member unchanged and referenced only
    // from inside the batch.
    fn validate_batch(&self, batch: &DeleteBatch) -> Result<(), InternalError> {
        for (key, expected) in batch.members() {
            let Some(current) = self.records.get(key) else {
                return Err(InternalError::store_conflict(
                    key.to_string(),
                    "record no longer exists",
                ));
            };
            if current.revision != expected {
                return Err(InternalError::store_conflict(
                    key.to_string(),
                    format!(
                        "revision changed from {expected} to {}",
                        current.revision
                    ),
                ));
            }
        }

        for (key, _) in batch.members() {
            if let Some((from, _)) = self
                .live_referrers(key)
                .find(|(from, _)| !batch.contains(from))
            {
                return Err(InternalError::store_conflict(
                    key.to_string(),
                    format!("now referenced by {from}"),
                ));
            }
        }

        Ok(())
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a record, returning its new revision.
    pub fn put(&self, record: Record) -> Revision {
        self.state.write().write(record)
    }

    /// Remove a single record outside any batch.
    pub fn remove(&self, key: &RecordRef) -> Option<Record> {
        self.state.write().take(key).map(|stored| stored.record)
    }

    #[must_use]
    pub fn exists(&self, key: &RecordRef) -> bool {
        self.state.read().records.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().records.is_empty()
    }

    /// Every stored identity, in canonical order.
    #[must_use]
    pub fn keys(&self) -> Vec<RecordRef> {
        self.state.read().records.keys().cloned().collect()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &RecordRef) -> Result<Option<StoredRecord>, InternalError> {
        Ok(self.state.read().records.get(key).cloned())
    }

    fn referenced_by(&self, key: &RecordRef) -> Result<Vec<ReferenceEdge>, InternalError> {
        let state = self.state.read();
        let edges = state
            .live_referrers(key)
            .flat_map(|(from, slots)| {
                slots.iter().map(move |via| ReferenceEdge {
                    from: from.clone(),
                    to: key.clone(),
                    via: *via,
                })
            })
            .collect();

        Ok(edges)
    }

    fn commit_delete(&self, batch: &DeleteBatch) -> Result<DeleteReceipt, InternalError> {
        if batch.is_empty() {
            return Err(InternalError::store_invariant(format!(
                "empty delete batch submitted (commit_id={})",
                batch.id
            )));
        }

        let mut state = self.state.write();
        state.validate_batch(batch)?;

        // Phase 2: mechanical removal under the same write lock.
        let mut guard = DeleteApplyGuard::new(&mut state);
        for (key, _) in batch.members() {
            guard.remove(key)?;
        }
        let removed = guard.finish()?;

        debug!(commit_id = %batch.id, removed = removed.len(), "delete batch committed");

        Ok(DeleteReceipt {
            commit_id: batch.id.to_string(),
            removed,
        })
    }
}
