#[cfg(test)]
mod tests;

use crate::{
    config::TreeConfig,
    error::InternalError,
    graph::{NodeId, ReferenceGraph},
    model::{ObjectType, PrimaryKey, RecordRef},
    obs::{MetricsEvent, MetricsSink},
    store::RecordStore,
};
use candid::CandidType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

///
/// ReferenceTreeNode
///
/// One record with its referencers (`incoming`) and referents (`outgoing`).
/// Leaves carry empty lists, never absent ones.
///

#[derive(CandidType, Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceTreeNode {
    pub primary_key: PrimaryKey,
    pub object_type: ObjectType,
    pub incoming: Vec<Self>,
    pub outgoing: Vec<Self>,
}

impl ReferenceTreeNode {
    #[must_use]
    pub fn leaf(key: &RecordRef) -> Self {
        Self {
            primary_key: key.primary_key.clone(),
            object_type: key.object_type,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.incoming.is_empty() && self.outgoing.is_empty()
    }

    /// Total nodes in this subtree, self included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self
            .incoming
            .iter()
            .chain(&self.outgoing)
            .map(Self::node_count)
            .sum::<usize>()
    }
}

///
/// TreeBuilder
///
/// Expands a reference tree in both directions. A record already on the
/// path from the root renders as a leaf, as does anything at `max_depth`
/// or anything reached after `max_nodes` nodes were emitted. A record is
/// never its own child.
///

pub struct TreeBuilder<'a, S: RecordStore + ?Sized> {
    graph: ReferenceGraph<'a, S>,
    max_depth: usize,
    max_nodes: usize,
    emitted: usize,
    truncated: bool,
    on_path: BTreeSet<NodeId>,
}

impl<'a, S: RecordStore + ?Sized> TreeBuilder<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, config: &TreeConfig) -> Self {
        Self {
            graph: ReferenceGraph::new(store),
            max_depth: config.max_depth,
            max_nodes: config.max_nodes,
            emitted: 0,
            truncated: false,
            on_path: BTreeSet::new(),
        }
    }

    /// Build the tree rooted at `root`; `NotFound` if the root is absent.
    pub fn build(
        mut self,
        root: &RecordRef,
        metrics: &dyn MetricsSink,
    ) -> Result<ReferenceTreeNode, InternalError> {
        let root_id = self.graph.intern(root);
        if !self.graph.expand(root_id)? {
            return Err(InternalError::store_not_found(root.to_string()));
        }

        let tree = self.render(root_id, 0)?;
        let nodes = tree.node_count();
        metrics.record(MetricsEvent::TreeBuilt {
            nodes: u64::try_from(nodes).unwrap_or(u64::MAX),
        });
        debug!(
            %root,
            nodes,
            graph_nodes = self.graph.len(),
            truncated = self.truncated,
            "reference tree built"
        );

        Ok(tree)
    }

    fn render(&mut self, id: NodeId, depth: usize) -> Result<ReferenceTreeNode, InternalError> {
        let key = self.graph.key(id).clone();
        self.emitted += 1;

        if self.on_path.contains(&id) || depth >= self.max_depth {
            return Ok(ReferenceTreeNode::leaf(&key));
        }
        if self.emitted >= self.max_nodes {
            self.truncated = true;
            return Ok(ReferenceTreeNode::leaf(&key));
        }
        // Children that vanished mid-read render as leaves; staleness on the
        // read path is tolerated.
        if !self.graph.expand(id)? {
            return Ok(ReferenceTreeNode::leaf(&key));
        }

        self.on_path.insert(id);
        let children = self.render_children(id, depth + 1);
        self.on_path.remove(&id);
        let (incoming, outgoing) = children?;

        Ok(ReferenceTreeNode {
            primary_key: key.primary_key,
            object_type: key.object_type,
            incoming,
            outgoing,
        })
    }

    fn render_children(
        &mut self,
        id: NodeId,
        depth: usize,
    ) -> Result<(Vec<ReferenceTreeNode>, Vec<ReferenceTreeNode>), InternalError> {
        let mut incoming_ids = self.graph.incoming(id)?;
        let mut outgoing_ids = self.graph.outgoing(id)?;
        incoming_ids.retain(|child| *child != id);
        outgoing_ids.retain(|child| *child != id);

        let incoming = self.render_all(&incoming_ids, depth)?;
        let outgoing = self.render_all(&outgoing_ids, depth)?;

        Ok((incoming, outgoing))
    }

    fn render_all(
        &mut self,
        ids: &[NodeId],
        depth: usize,
    ) -> Result<Vec<ReferenceTreeNode>, InternalError> {
        ids.iter().map(|id| self.render(*id, depth)).collect()
    }
}
