//! Shared adjacency view over a node/edge set
//!
//! The connection validator, the dirty tracker and the planner all walk
//! the graph along edges. They build the same [`GraphView`] so that they
//! always agree on its shape.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{ComputeFlowError, Result};
use crate::types::{EdgeDefinition, NodeDefinition};

/// Borrowed adjacency list plus in-degree counts
#[derive(Debug, Clone, Default)]
pub struct GraphView<'a> {
    /// Known nodes in document order
    nodes: Vec<&'a str>,
    successors: HashMap<&'a str, Vec<&'a str>>,
    in_degree: HashMap<&'a str, usize>,
}

impl<'a> GraphView<'a> {
    /// Build a view from edges alone
    ///
    /// Nodes are whatever the edges mention.
    pub fn from_edges(edges: &'a [EdgeDefinition]) -> Self {
        let mut view = Self::default();
        for edge in edges {
            view.insert_node(&edge.source.node_id);
            view.insert_node(&edge.target.node_id);
            view.insert_edge(edge);
        }
        view
    }

    /// Build a view over a full node set
    ///
    /// Fails if an edge references a node that is not in `nodes`.
    pub fn new(nodes: &'a [NodeDefinition], edges: &'a [EdgeDefinition]) -> Result<Self> {
        let mut view = Self::with_nodes(nodes);
        for edge in edges {
            for node_id in [&edge.source.node_id, &edge.target.node_id] {
                if !view.contains(node_id) {
                    return Err(ComputeFlowError::unknown_node(&edge.id, node_id));
                }
            }
            view.insert_edge(edge);
        }
        Ok(view)
    }

    /// Build the view induced by `nodes`
    ///
    /// Edges with an endpoint outside the node set are skipped. Used for
    /// subgraphs whose boundary edges lead to nodes that are not re-run.
    pub fn induced(nodes: &'a [NodeDefinition], edges: &'a [EdgeDefinition]) -> Self {
        let mut view = Self::with_nodes(nodes);
        for edge in edges {
            if view.contains(&edge.source.node_id) && view.contains(&edge.target.node_id) {
                view.insert_edge(edge);
            }
        }
        view
    }

    fn with_nodes(nodes: &'a [NodeDefinition]) -> Self {
        let mut view = Self::default();
        for node in nodes {
            view.insert_node(&node.id);
        }
        view
    }

    fn insert_node(&mut self, node_id: &'a str) {
        if !self.in_degree.contains_key(node_id) {
            self.nodes.push(node_id);
            self.in_degree.insert(node_id, 0);
        }
    }

    fn insert_edge(&mut self, edge: &'a EdgeDefinition) {
        self.successors
            .entry(edge.source.node_id.as_str())
            .or_default()
            .push(edge.target.node_id.as_str());
        *self.in_degree.entry(edge.target.node_id.as_str()).or_insert(0) += 1;
    }

    /// Whether the view knows this node
    pub fn contains(&self, node_id: &str) -> bool {
        self.in_degree.contains_key(node_id)
    }

    /// Node IDs in insertion order
    pub fn nodes(&self) -> &[&'a str] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Direct successors of a node (one entry per edge)
    pub fn successors(&self, node_id: &str) -> &[&'a str] {
        self.successors
            .get(node_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of incoming edges
    pub fn in_degree(&self, node_id: &str) -> usize {
        self.in_degree.get(node_id).copied().unwrap_or(0)
    }

    /// Whether `to` can be reached from `from` by following edges forward
    ///
    /// A node always reaches itself.
    pub fn reaches(&self, from: &str, to: &str) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack: Vec<&str> = vec![from];

        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            stack.extend(self.successors(current).iter().copied());
        }

        false
    }

    /// Breadth-first forward closure of `origin`, origin first
    ///
    /// Each node appears once regardless of how many paths reach it.
    pub fn downstream(&self, origin: &'a str) -> Vec<&'a str> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut order = vec![origin];
        let mut queue: VecDeque<&'a str> = VecDeque::from([origin]);
        visited.insert(origin);

        while let Some(current) = queue.pop_front() {
            for &next in self.successors(current) {
                if visited.insert(next) {
                    order.push(next);
                    queue.push_back(next);
                }
            }
        }

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, PortRef};

    fn edge(id: &str, from: &str, to: &str) -> EdgeDefinition {
        EdgeDefinition::new(
            id,
            PortRef::new(from, format!("{from}-output-0")),
            PortRef::new(to, format!("{to}-input-0")),
            DataType::Any,
        )
    }

    #[test]
    fn test_from_edges_counts_degrees() {
        let edges = vec![edge("e1", "a", "b"), edge("e2", "a", "c"), edge("e3", "b", "c")];
        let view = GraphView::from_edges(&edges);

        assert_eq!(view.nodes(), &["a", "b", "c"]);
        assert_eq!(view.in_degree("a"), 0);
        assert_eq!(view.in_degree("c"), 2);
        assert_eq!(view.successors("a"), &["b", "c"]);
        assert!(view.successors("c").is_empty());
    }

    #[test]
    fn test_reaches() {
        let edges = vec![edge("e1", "a", "b"), edge("e2", "b", "c")];
        let view = GraphView::from_edges(&edges);

        assert!(view.reaches("a", "c"));
        assert!(!view.reaches("c", "a"));
        assert!(view.reaches("d", "d"));
        assert!(!view.reaches("d", "a"));
    }

    #[test]
    fn test_reaches_terminates_on_cycles() {
        let edges = vec![edge("e1", "a", "b"), edge("e2", "b", "a")];
        let view = GraphView::from_edges(&edges);
        assert!(!view.reaches("a", "z"));
    }

    #[test]
    fn test_downstream_visits_each_node_once() {
        let edges = vec![
            edge("e1", "a", "b"),
            edge("e2", "a", "c"),
            edge("e3", "b", "d"),
            edge("e4", "c", "d"),
        ];
        let view = GraphView::from_edges(&edges);
        assert_eq!(view.downstream("a"), vec!["a", "b", "c", "d"]);
        assert_eq!(view.downstream("d"), vec!["d"]);
    }
}
