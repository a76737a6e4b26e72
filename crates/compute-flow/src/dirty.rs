//! Dirty-state tracking for incremental re-execution
//!
//! When a node changes, everything that consumes its output (directly or
//! transitively) is stale. Only that forward closure needs to run again,
//! which keeps interactive edits from re-generating the whole pipeline.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::graph_view::GraphView;
use crate::types::{ComputeGraphDocument, EdgeDefinition, NodeDefinition, NodeId, NodeStatus};

/// Nodes and edges restricted to the dirty part of a graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirtySubgraph {
    pub nodes: Vec<NodeDefinition>,
    pub edges: Vec<EdgeDefinition>,
}

impl DirtySubgraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id.as_str())
    }
}

/// Collect `node_id` and every node reachable from it along edges
///
/// Traversal is breadth-first and strictly forward (source to target).
pub fn mark_dirty_downstream(node_id: &str, edges: &[EdgeDefinition]) -> HashSet<NodeId> {
    let view = GraphView::from_edges(edges);
    let dirty: HashSet<NodeId> = view
        .downstream(node_id)
        .into_iter()
        .map(str::to_string)
        .collect();

    log::debug!(
        "Node '{}' changed: {} node(s) downstream marked dirty",
        node_id,
        dirty.len()
    );
    dirty
}

/// Restrict a graph to its dirty nodes
///
/// A node is dirty if its `isDirty` flag is set or its status is `dirty`.
/// An edge is kept if either endpoint is dirty, so a stale consumer still
/// sees its incoming edge and a stale producer its outgoing ones.
pub fn compute_dirty_subgraph(nodes: &[NodeDefinition], edges: &[EdgeDefinition]) -> DirtySubgraph {
    let dirty_ids: HashSet<&str> = nodes
        .iter()
        .filter(|n| n.is_stale())
        .map(|n| n.id.as_str())
        .collect();

    let dirty_edges = edges
        .iter()
        .filter(|e| {
            dirty_ids.contains(e.source.node_id.as_str())
                || dirty_ids.contains(e.target.node_id.as_str())
        })
        .cloned()
        .collect();

    let dirty_nodes = nodes
        .iter()
        .filter(|n| dirty_ids.contains(n.id.as_str()))
        .cloned()
        .collect();

    DirtySubgraph {
        nodes: dirty_nodes,
        edges: dirty_edges,
    }
}

impl ComputeGraphDocument {
    /// Mark a node and its downstream closure dirty
    ///
    /// Sets the dirty flag and `dirty` status on every affected node that
    /// exists in the document and returns the closure.
    pub fn mark_dirty(&mut self, node_id: &str) -> HashSet<NodeId> {
        let dirty = mark_dirty_downstream(node_id, &self.edges);
        for node in self.nodes.iter_mut().filter(|n| dirty.contains(&n.id)) {
            node.runtime.is_dirty = true;
            node.runtime.status = NodeStatus::Dirty;
        }
        dirty
    }

    /// The dirty part of this document
    pub fn dirty_subgraph(&self) -> DirtySubgraph {
        compute_dirty_subgraph(&self.nodes, &self.edges)
    }

    /// Clear the dirty flag on every node
    ///
    /// Nodes still carrying the `dirty` status go back to `idle`.
    pub fn clear_dirty(&mut self) {
        for node in &mut self.nodes {
            node.runtime.is_dirty = false;
            if node.runtime.status == NodeStatus::Dirty {
                node.runtime.status = NodeStatus::Idle;
            }
        }
    }
}
