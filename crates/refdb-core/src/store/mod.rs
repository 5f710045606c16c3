//! Record store capability.
//!
//! The durable store is an external collaborator. This module names the
//! three things the engine needs from it (point lookup, reverse reference
//! lookup, and an atomic conflict-detecting batch delete) and ships an
//! in-memory implementation.

mod guard;
mod memory;


pub use memory::MemoryStore;

use crate::{
    error::InternalError,
    model::{RecordRef, ReferenceEdge, Revision, StoredRecord},
};
use candid::CandidType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ulid::Ulid;

///
/// RecordStore
///
/// Contract for the backing record store. Every call observes the store's
/// committed state at call time; nothing is cached across calls.
///

pub trait RecordStore: Send + Sync {
    /// Point lookup by identity.
    fn get(&self, key: &RecordRef) -> Result<Option<StoredRecord>, InternalError>;

    /// Reverse index: every edge whose target is `key`.
    fn referenced_by(&self, key: &RecordRef) -> Result<Vec<ReferenceEdge>, InternalError>;

    /// Atomically remove every batch member.
    ///
    /// Must fail with a `Conflict` error and leave the store untouched when
    /// any member is missing, was rewritten since the revision recorded in
    /// the batch, or is referenced by a record outside the batch.
    fn commit_delete(&self, batch: &DeleteBatch) -> Result<DeleteReceipt, InternalError>;

    fn contains(&self, key: &RecordRef) -> Result<bool, InternalError> {
        Ok(self.get(key)?.is_some())
    }
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn get(&self, key: &RecordRef) -> Result<Option<StoredRecord>, InternalError> {
        (**self).get(key)
    }

    fn referenced_by(&self, key: &RecordRef) -> Result<Vec<ReferenceEdge>, InternalError> {
        (**self).referenced_by(key)
    }

    fn commit_delete(&self, batch: &DeleteBatch) -> Result<DeleteReceipt, InternalError> {
        (**self).commit_delete(batch)
    }
}

///
/// DeleteBatch
///
/// Records to remove together, each pinned to the revision observed while
/// the batch was computed.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeleteBatch {
    pub id: Ulid,
    members: BTreeMap<RecordRef, Revision>,
}

impl DeleteBatch {
    #[must_use]
    pub fn new(members: BTreeMap<RecordRef, Revision>) -> Self {
        Self {
            id: Ulid::new(),
            members,
        }
    }

    #[must_use]
    pub fn contains(&self, key: &RecordRef) -> bool {
        self.members.contains_key(key)
    }

    pub fn members(&self) -> impl Iterator<Item = (&RecordRef, Revision)> {
        self.members.iter().map(|(key, rev)| (key, *rev))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

///
/// DeleteReceipt
///
/// Outcome of a committed batch, in removal order.
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DeleteReceipt {
    pub commit_id: String,
    pub removed: Vec<RecordRef>,
}
