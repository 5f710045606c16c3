//! Exclusivity analysis for cascading deletes.
//!
//! Starting from a root, the support set grows by every referencer whose
//! own referencers are all already members. The analysis is pure: it reads
//! the store through a request-scoped graph and never mutates anything, so
//! it can be re-run at will.


use crate::{
    error::InternalError,
    graph::{NodeId, ReferenceGraph},
    model::{ObjectType, RecordRef, Revision},
    store::RecordStore,
};
use candid::CandidType;
use derive_more::IntoIterator;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};
use tracing::debug;

///
/// SupportSet
///
/// Records that can be deleted together, each pinned to the revision it was
/// read at. Only ever grows during analysis.
///

#[derive(Clone, Debug, Default, Eq, IntoIterator, PartialEq)]
pub struct SupportSet {
    #[into_iterator(owned, ref)]
    members: BTreeMap<RecordRef, Revision>,
}

impl SupportSet {
    #[must_use]
    pub fn contains(&self, key: &RecordRef) -> bool {
        self.members.contains_key(key)
    }

    #[must_use]
    pub fn revision(&self, key: &RecordRef) -> Option<Revision> {
        self.members.get(key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &RecordRef> {
        self.members.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn insert(&mut self, key: RecordRef, revision: Revision) {
        self.members.insert(key, revision);
    }

    // Union with another closure; shared members collapse.
    fn absorb(&mut self, other: Self) {
        self.members.extend(other.members);
    }

    pub(crate) fn into_members(self) -> BTreeMap<RecordRef, Revision> {
        self.members
    }
}

///
/// RejectionKind
///

#[derive(CandidType, Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum RejectionKind {
    /// A dependent that would have to go is still used by an outside record.
    ReferencedDependent,

    /// A record of a type that never cascades points into the set.
    IneligibleReferencer,
}

///
/// Rejection
///
/// `blocking` is the outside record whose integrity the delete would break;
/// `blocked` is the record it protects.
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Rejection {
    pub blocking: RecordRef,
    pub blocked: RecordRef,
    pub kind: RejectionKind,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RejectionKind::ReferencedDependent => write!(
                f,
                "Referencing object {} itself is referenced by {}",
                self.blocked.primary_key, self.blocking.primary_key
            ),
            RejectionKind::IneligibleReferencer => write!(
                f,
                "Object {} is referenced by {} {}",
                self.blocked.primary_key, self.blocking.object_type, self.blocking.primary_key
            ),
        }
    }
}

///
/// DeleteDecision
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DeleteDecision {
    Approved(SupportSet),
    Rejected(Rejection),
    Unauthorized,
    UnsupportedObjectType(ObjectType),
}

impl DeleteDecision {
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::Approved(_))
    }
}

///
/// ExclusivityAnalyzer
///

pub struct ExclusivityAnalyzer<'a, S: RecordStore + ?Sized> {
    graph: ReferenceGraph<'a, S>,
    max_support_set: usize,
}

impl<'a, S: RecordStore + ?Sized> ExclusivityAnalyzer<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, max_support_set: usize) -> Self {
        Self {
            graph: ReferenceGraph::new(store),
            max_support_set,
        }
    }

    /// Nodes loaded so far by this analysis.
    #[must_use]
    pub fn graph_len(&self) -> usize {
        self.graph.len()
    }

    /// Analyze several roots. Each root gets its own closure; approved
    /// closures are unioned and the first non-approval (in root order) wins.
    pub fn analyze_all(&mut self, roots: &[RecordRef]) -> Result<DeleteDecision, InternalError> {
        if let Some(root) = roots.iter().find(|root| !root.object_type.is_cascade_eligible()) {
            return Ok(DeleteDecision::UnsupportedObjectType(root.object_type));
        }

        let mut union = SupportSet::default();
        let mut seen = BTreeSet::new();
        for root in roots {
            if !seen.insert(root) || union.contains(root) {
                continue;
            }

            match self.analyze(root)? {
                DeleteDecision::Approved(closure) => union.absorb(closure),
                decision => return Ok(decision),
            }
            self.check_limit(union.len())?;
        }

        Ok(DeleteDecision::Approved(union))
    }

    /// Compute the support set of one root.
    pub fn analyze(&mut self, root: &RecordRef) -> Result<DeleteDecision, InternalError> {
        if !root.object_type.is_cascade_eligible() {
            return Ok(DeleteDecision::UnsupportedObjectType(root.object_type));
        }

        let root_id = self.graph.intern(root);
        if !self.graph.expand(root_id)? {
            return Err(InternalError::store_not_found(root.to_string()));
        }

        let mut support = SupportSet::default();
        support.insert(root.clone(), self.graph.revision(root_id)?);

        let mut pending = BTreeSet::new();
        self.enqueue_referencers(root_id, &support, &mut pending)?;

        // Fixed point: a pass that admits nobody ends the search.
        loop {
            let mut admitted = Vec::new();
            let mut vanished = Vec::new();

            for candidate in &pending {
                let id = self.graph.intern(candidate);
                if !self.graph.expand(id)? {
                    vanished.push(candidate.clone());
                    continue;
                }
                if candidate.object_type.is_cascade_eligible()
                    && self.first_outside_referencer(id, &support)?.is_none()
                {
                    admitted.push(id);
                }
            }

            for key in &vanished {
                pending.remove(key);
            }
            if admitted.is_empty() {
                break;
            }

            for id in &admitted {
                let key = self.graph.key(*id).clone();
                pending.remove(&key);
                support.insert(key, self.graph.revision(*id)?);
            }
            self.check_limit(support.len())?;

            for id in admitted {
                self.enqueue_referencers(id, &support, &mut pending)?;
            }
        }

        if let Some(candidate) = pending.first() {
            let rejection = self.reject(candidate, &support)?;
            debug!(%root, blocking = %rejection.blocking, blocked = %rejection.blocked, "cascading delete rejected");

            return Ok(DeleteDecision::Rejected(rejection));
        }

        debug!(%root, members = support.len(), "support set closed");

        Ok(DeleteDecision::Approved(support))
    }

    // Queue referencers of `id` that are not yet members.
    fn enqueue_referencers(
        &mut self,
        id: NodeId,
        support: &SupportSet,
        pending: &mut BTreeSet<RecordRef>,
    ) -> Result<(), InternalError> {
        for source in self.graph.incoming(id)? {
            let key = self.graph.key(source);
            if !support.contains(key) {
                pending.insert(key.clone());
            }
        }

        Ok(())
    }

    // First referencer of `id` (other than itself) outside the support set.
    fn first_outside_referencer(
        &mut self,
        id: NodeId,
        support: &SupportSet,
    ) -> Result<Option<RecordRef>, InternalError> {
        let outside = self
            .graph
            .incoming(id)?
            .into_iter()
            .filter(|source| *source != id)
            .map(|source| self.graph.key(source))
            .find(|key| !support.contains(key))
            .cloned();

        Ok(outside)
    }

    fn reject(
        &mut self,
        candidate: &RecordRef,
        support: &SupportSet,
    ) -> Result<Rejection, InternalError> {
        let id = self.graph.intern(candidate);

        if candidate.object_type.is_cascade_eligible() {
            let blocking = self.first_outside_referencer(id, support)?.ok_or_else(|| {
                InternalError::graph_invariant(format!(
                    "pending dependent has no outside referencer: {candidate}"
                ))
            })?;

            return Ok(Rejection {
                blocking,
                blocked: candidate.clone(),
                kind: RejectionKind::ReferencedDependent,
            });
        }

        let blocked = self
            .graph
            .outgoing(id)?
            .into_iter()
            .map(|target| self.graph.key(target))
            .find(|key| support.contains(key))
            .cloned()
            .ok_or_else(|| {
                InternalError::graph_invariant(format!(
                    "pending referencer points at no support set member: {candidate}"
                ))
            })?;

        Ok(Rejection {
            blocking: candidate.clone(),
            blocked,
            kind: RejectionKind::IneligibleReferencer,
        })
    }

    fn check_limit(&self, len: usize) -> Result<(), InternalError> {
        if len > self.max_support_set {
            return Err(InternalError::analyzer_unsupported(format!(
                "support set of {len} records exceeds the limit of {}",
                self.max_support_set
            )));
        }

        Ok(())
    }
}
