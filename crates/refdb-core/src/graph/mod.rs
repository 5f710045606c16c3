//! Request-scoped reference graph arena.
//!
//! Nodes are interned by identity and addressed by `NodeId`; adjacency is
//! index-based and loaded on first use. A graph lives for one operation and
//! is then dropped, so nothing here outlives the store state it was read
//! from.

use crate::{
    error::InternalError,
    index::ReferenceIndex,
    model::{RecordRef, Revision},
    store::RecordStore,
};
use std::collections::BTreeMap;

///
/// NodeId
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeId(usize);

///
/// Adjacency
///
/// Load state of one node. `Missing` means the record disappeared (or never
/// existed) when the node was first expanded.
///

#[derive(Debug)]
enum Adjacency {
    Unloaded,
    Missing,
    Loaded {
        revision: Revision,
        incoming: Vec<NodeId>,
        outgoing: Vec<NodeId>,
    },
}

#[derive(Debug)]
struct GraphNode {
    key: RecordRef,
    adjacency: Adjacency,
}

///
/// ReferenceGraph
///

pub struct ReferenceGraph<'a, S: RecordStore + ?Sized> {
    index: ReferenceIndex<'a, S>,
    nodes: Vec<GraphNode>,
    lookup: BTreeMap<RecordRef, NodeId>,
}

impl<'a, S: RecordStore + ?Sized> ReferenceGraph<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self {
            index: ReferenceIndex::new(store),
            nodes: Vec::new(),
            lookup: BTreeMap::new(),
        }
    }

    /// Return the id for `key`, allocating an unloaded node on first sight.
    pub fn intern(&mut self, key: &RecordRef) -> NodeId {
        if let Some(id) = self.lookup.get(key) {
            return *id;
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(GraphNode {
            key: key.clone(),
            adjacency: Adjacency::Unloaded,
        });
        self.lookup.insert(key.clone(), id);

        id
    }

    #[must_use]
    pub fn key(&self, id: NodeId) -> &RecordRef {
        &self.nodes[id.0].key
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Load adjacency for `id` if needed. Returns `false` when the record
    /// does not exist in the store.
    pub fn expand(&mut self, id: NodeId) -> Result<bool, InternalError> {
        match self.nodes[id.0].adjacency {
            Adjacency::Loaded { .. } => return Ok(true),
            Adjacency::Missing => return Ok(false),
            Adjacency::Unloaded => {}
        }

        let key = self.nodes[id.0].key.clone();
        let stored = match self.index.record(&key) {
            Ok(stored) => stored,
            Err(err) if err.is_not_found() => {
                self.nodes[id.0].adjacency = Adjacency::Missing;
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        // Both sets arrive sorted, so interned id lists keep canonical order.
        let outgoing = self
            .index
            .resolve_outgoing(&stored.record)?
            .iter()
            .map(|target| self.intern(target))
            .collect();
        let incoming = self
            .index
            .referencers(&key)?
            .iter()
            .map(|source| self.intern(source))
            .collect();

        self.nodes[id.0].adjacency = Adjacency::Loaded {
            revision: stored.revision,
            incoming,
            outgoing,
        };

        Ok(true)
    }

    /// Records pointing at `id`, in canonical order.
    pub fn incoming(&mut self, id: NodeId) -> Result<Vec<NodeId>, InternalError> {
        self.loaded(id).map(|(_, incoming, _)| incoming.to_vec())
    }

    /// Records `id` points to, in canonical order.
    pub fn outgoing(&mut self, id: NodeId) -> Result<Vec<NodeId>, InternalError> {
        self.loaded(id).map(|(_, _, outgoing)| outgoing.to_vec())
    }

    /// Revision the node was read at.
    pub fn revision(&mut self, id: NodeId) -> Result<Revision, InternalError> {
        self.loaded(id).map(|(revision, _, _)| revision)
    }

    fn loaded(&mut self, id: NodeId) -> Result<(Revision, &[NodeId], &[NodeId]), InternalError> {
        if !self.expand(id)? {
            return Err(InternalError::store_not_found(self.key(id).to_string()));
        }

        match &self.nodes[id.0].adjacency {
            Adjacency::Loaded {
                revision,
                incoming,
                outgoing,
            } => Ok((*revision, incoming, outgoing)),
            _ => Err(InternalError::graph_invariant(format!(
                "node expanded but adjacency not loaded: {}",
                self.key(id)
            ))),
        }
    }
}

///
/// TESTS
///
