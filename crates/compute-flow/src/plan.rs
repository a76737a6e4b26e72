//! Execution planning
//!
//! Orders the nodes of a graph so that every producer runs before its
//! consumers, using Kahn's algorithm over a [`GraphView`]. Nodes that
//! cannot be ordered because they sit on or behind a cycle are reported
//! together as a single `cycles` entry.
//!
//! The order is a valid topological order, not a total one: nodes with
//! no path between them may run in any relative order, or concurrently.
//! [`ExecutionPlan::stages`] groups the order into levels for executors
//! that want to do so.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::dirty::DirtySubgraph;
use crate::error::Result;
use crate::graph_view::GraphView;
use crate::types::{ComputeGraphDocument, EdgeDefinition, NodeDefinition, NodeId};

/// Run order for a graph plus any nodes that could not be ordered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    pub execution_order: Vec<NodeId>,
    pub cycles: Vec<Vec<NodeId>>,
}

impl ExecutionPlan {
    /// Whether the order covers the whole graph
    pub fn is_runnable(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Group the execution order into dependency levels
    ///
    /// Every node in a stage only depends on nodes in earlier stages.
    /// Edges touching nodes outside the order are ignored.
    pub fn stages(&self, edges: &[EdgeDefinition]) -> Vec<Vec<NodeId>> {
        let ordered: HashSet<&str> = self.execution_order.iter().map(String::as_str).collect();
        let mut predecessors: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in edges {
            let (source, target) = (edge.source.node_id.as_str(), edge.target.node_id.as_str());
            if ordered.contains(source) && ordered.contains(target) {
                predecessors.entry(target).or_default().push(source);
            }
        }

        let mut level: HashMap<&str, usize> = HashMap::new();
        let mut stages: Vec<Vec<NodeId>> = Vec::new();
        for node_id in &self.execution_order {
            let depth = predecessors
                .get(node_id.as_str())
                .into_iter()
                .flatten()
                .filter_map(|p| level.get(p))
                .map(|d| d + 1)
                .max()
                .unwrap_or(0);
            level.insert(node_id.as_str(), depth);

            if stages.len() <= depth {
                stages.resize_with(depth + 1, Vec::new);
            }
            stages[depth].push(node_id.clone());
        }

        stages
    }
}

/// Plan a full document
///
/// Fails only if an edge references a node missing from the document.
pub fn plan(document: &ComputeGraphDocument) -> Result<ExecutionPlan> {
    plan_graph(&document.nodes, &document.edges)
}

/// Plan an explicit node/edge set
pub fn plan_graph(nodes: &[NodeDefinition], edges: &[EdgeDefinition]) -> Result<ExecutionPlan> {
    let view = GraphView::new(nodes, edges)?;
    Ok(topological_order(&view))
}

/// Plan a dirty subgraph for a partial run
///
/// Boundary edges (one endpoint outside the subgraph) lead to clean nodes
/// whose outputs are already available, so they impose no ordering.
pub fn plan_subgraph(subgraph: &DirtySubgraph) -> ExecutionPlan {
    let view = GraphView::induced(&subgraph.nodes, &subgraph.edges);
    topological_order(&view)
}

/// Kahn's algorithm over a graph view
fn topological_order(view: &GraphView<'_>) -> ExecutionPlan {
    let mut in_degree: HashMap<&str, usize> = view
        .nodes()
        .iter()
        .map(|&id| (id, view.in_degree(id)))
        .collect();

    let mut queue: VecDeque<&str> = view
        .nodes()
        .iter()
        .copied()
        .filter(|id| in_degree[id] == 0)
        .collect();

    let mut execution_order: Vec<NodeId> = Vec::with_capacity(view.node_count());
    while let Some(node_id) = queue.pop_front() {
        execution_order.push(node_id.to_string());
        for &next in view.successors(node_id) {
            if let Some(deg) = in_degree.get_mut(next) {
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(next);
                }
            }
        }
    }

    let mut cycles = Vec::new();
    if execution_order.len() < view.node_count() {
        let ordered: HashSet<&str> = execution_order.iter().map(String::as_str).collect();
        let remaining: Vec<NodeId> = view
            .nodes()
            .iter()
            .filter(|id| !ordered.contains(*id))
            .map(|id| id.to_string())
            .collect();
        log::warn!(
            "Execution plan incomplete: {} node(s) are part of or behind a cycle: {:?}",
            remaining.len(),
            remaining
        );
        cycles.push(remaining);
    } else {
        log::debug!("Execution plan ready: {} node(s)", execution_order.len());
    }

    ExecutionPlan {
        execution_order,
        cycles,
    }
}
