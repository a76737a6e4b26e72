//! Editing session over the working format
//!
//! `EditSession` is what an editor drives while the user works: it owns
//! the [`WorkingGraph`] plus per-node and per-edge status tables, gates
//! every new connection through the validator, and keeps dirty state up
//! to date. Validation and planning always go through the serializer's
//! document form; nothing here re-implements those rules.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;

use crate::config::SerializerConfig;
use crate::connection::{validate_edge, ConnectionError, ConnectionVerdict};
use crate::dirty::{compute_dirty_subgraph, mark_dirty_downstream, DirtySubgraph};
use crate::error::{ComputeFlowError, Result};
use crate::events::{EventSink, GraphEvent, NullEventSink};
use crate::plan::{plan_subgraph, ExecutionPlan};
use crate::serializer::{to_document, to_edge, to_edges, to_node, DocumentInfo};
use crate::types::{
    ComputeGraphDocument, EdgeStatus, NodeDefinition, NodeId, NodeStatus, Params, Position,
};
use crate::working::{Block, BlockConnection, BlockType, WorkingGraph};

/// Live editing state for one workflow
pub struct EditSession {
    graph: WorkingGraph,
    node_statuses: HashMap<NodeId, NodeStatus>,
    edge_statuses: HashMap<String, EdgeStatus>,
    config: SerializerConfig,
    events: Arc<dyn EventSink>,
}

impl EditSession {
    /// Create an empty session
    pub fn new() -> Self {
        Self::from_graph(WorkingGraph::new())
    }

    /// Start a session from an existing working graph
    pub fn from_graph(graph: WorkingGraph) -> Self {
        Self {
            graph,
            node_statuses: HashMap::new(),
            edge_statuses: HashMap::new(),
            config: SerializerConfig::default(),
            events: Arc::new(NullEventSink),
        }
    }

    /// Report edits to the given sink
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    /// Use a custom serializer configuration
    pub fn with_config(mut self, config: SerializerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn graph(&self) -> &WorkingGraph {
        &self.graph
    }

    /// Current status of a node (`idle` if never set)
    pub fn node_status(&self, node_id: &str) -> NodeStatus {
        self.node_statuses.get(node_id).copied().unwrap_or_default()
    }

    /// Current status of an edge (`idle` if never set)
    pub fn edge_status(&self, edge_id: &str) -> EdgeStatus {
        self.edge_statuses.get(edge_id).copied().unwrap_or_default()
    }

    /// Add an empty block
    pub fn add_node(
        &mut self,
        id: impl Into<String>,
        block_type: BlockType,
        position: impl Into<Position>,
    ) {
        self.graph.insert_block(Block::new(id, block_type, position));
    }

    /// Remove a block together with its connections
    pub fn remove_node(&mut self, node_id: &str) -> Option<Block> {
        let dropped: Vec<String> = self
            .graph
            .connections
            .iter()
            .filter(|c| c.touches(node_id))
            .map(|c| c.id.clone())
            .collect();

        let block = self.graph.remove_block(node_id)?;
        self.node_statuses.remove(node_id);
        for connection_id in dropped {
            self.edge_statuses.remove(&connection_id);
            self.emit(GraphEvent::ConnectionRemoved { connection_id });
        }
        Some(block)
    }

    /// Validate and add a connection
    ///
    /// On acceptance the source's current output (if any) is copied into
    /// the target input, and the target and everything downstream of it
    /// become dirty. Rejected connections leave the graph untouched.
    pub fn connect(&mut self, connection: BlockConnection) -> ConnectionVerdict {
        let verdict = if self.graph.has_connection(&connection) {
            ConnectionVerdict::rejected(ConnectionError::Duplicate)
        } else if self.graph.connection(&connection.id).is_some() {
            ConnectionVerdict::rejected(ConnectionError::DuplicateId {
                id: connection.id.clone(),
            })
        } else {
            let edge = to_edge(&connection);
            let nodes = self.endpoint_nodes(&connection);
            let existing = to_edges(&self.graph.connections);
            validate_edge(&edge, &nodes, &existing)
        };

        let connection_id = connection.id.clone();
        match verdict.message() {
            Some(error) => {
                log::debug!("Rejected connection '{}': {}", connection_id, error);
                self.emit(GraphEvent::ConnectionRejected {
                    connection_id,
                    error,
                });
            }
            None => {
                let target = connection.target_block_id.clone();
                let current = self
                    .block_output(&connection.source_block_id, &connection.resolved_source_port())
                    .cloned();
                if let Some(value) = current {
                    let input_id = connection.resolved_target_port();
                    self.write_input(&target, input_id, value);
                }
                self.graph.connections.push(connection);
                self.emit(GraphEvent::ConnectionAccepted { connection_id });
                self.mark_node_dirty(&target);
            }
        }

        verdict
    }

    /// Nodes for the two blocks a connection joins
    fn endpoint_nodes(&self, connection: &BlockConnection) -> Vec<NodeDefinition> {
        [&connection.source_block_id, &connection.target_block_id]
            .into_iter()
            .filter_map(|id| self.graph.block(id))
            .map(|block| to_node(block, &self.config))
            .collect()
    }

    /// Value currently held by a block input
    pub fn block_input(&self, block_id: &str, input_id: &str) -> Option<&Value> {
        self.graph.block(block_id)?.inputs.get(input_id)
    }

    /// Value last produced on a block output
    pub fn block_output(&self, block_id: &str, output_id: &str) -> Option<&Value> {
        self.graph.block(block_id)?.outputs.get(output_id)
    }

    /// Record a block output and push it into every connected input
    ///
    /// Returns the IDs of the blocks that received the value.
    pub fn update_block_output(
        &mut self,
        block_id: &str,
        output_id: &str,
        value: Value,
    ) -> Result<Vec<NodeId>> {
        let block = self
            .graph
            .block_mut(block_id)
            .ok_or_else(|| ComputeFlowError::NodeNotFound(block_id.to_string()))?;
        block.outputs.insert(output_id.to_string(), value.clone());

        let targets: Vec<(NodeId, String)> = self
            .graph
            .connections
            .iter()
            .filter(|c| c.source_block_id == block_id && c.resolved_source_port() == output_id)
            .map(|c| (c.target_block_id.clone(), c.resolved_target_port()))
            .collect();

        let mut updated = Vec::with_capacity(targets.len());
        for (target, input_id) in targets {
            if self.write_input(&target, input_id, value.clone()) {
                updated.push(target);
            }
        }

        log::debug!(
            "Output '{}' of block '{}' pushed to {} block(s)",
            output_id,
            block_id,
            updated.len()
        );
        Ok(updated)
    }

    fn write_input(&mut self, block_id: &str, input_id: String, value: Value) -> bool {
        match self.graph.block_mut(block_id) {
            Some(block) => {
                block.inputs.insert(input_id, value);
                true
            }
            None => false,
        }
    }

    /// Remove a connection by ID
    pub fn disconnect(&mut self, connection_id: &str) -> Option<BlockConnection> {
        let removed = self.graph.remove_connection(connection_id)?;
        self.edge_statuses.remove(connection_id);
        self.emit(GraphEvent::ConnectionRemoved {
            connection_id: connection_id.to_string(),
        });
        Some(removed)
    }

    /// Replace a block's settings and mark it and its consumers dirty
    pub fn update_params(&mut self, node_id: &str, params: Params) -> Result<HashSet<NodeId>> {
        let block = self
            .graph
            .block_mut(node_id)
            .ok_or_else(|| ComputeFlowError::NodeNotFound(node_id.to_string()))?;
        block.inputs = params;
        Ok(self.mark_node_dirty(node_id))
    }

    /// Mark a node and its downstream closure dirty
    pub fn mark_node_dirty(&mut self, node_id: &str) -> HashSet<NodeId> {
        let edges = to_edges(&self.graph.connections);
        let dirty = mark_dirty_downstream(node_id, &edges);

        for id in &dirty {
            self.node_statuses.insert(id.clone(), NodeStatus::Dirty);
        }

        let mut node_ids: Vec<String> = dirty.iter().cloned().collect();
        node_ids.sort();
        self.emit(GraphEvent::NodesMarkedDirty { node_ids });
        dirty
    }

    /// Record a node status reported by an executor
    pub fn set_node_status(&mut self, node_id: &str, status: NodeStatus) {
        self.node_statuses.insert(node_id.to_string(), status);
        self.emit(GraphEvent::NodeStatusChanged {
            node_id: node_id.to_string(),
            status,
        });
    }

    /// Record an edge status reported by an executor
    pub fn set_edge_status(&mut self, edge_id: &str, status: EdgeStatus) {
        self.edge_statuses.insert(edge_id.to_string(), status);
        self.emit(GraphEvent::EdgeStatusChanged {
            edge_id: edge_id.to_string(),
            status,
        });
    }

    /// Serialize the session, carrying node and edge statuses along
    pub fn to_document(&self, info: &DocumentInfo) -> ComputeGraphDocument {
        let mut document = to_document(&self.graph, info, &self.config);

        for node in &mut document.nodes {
            if let Some(&status) = self.node_statuses.get(&node.id) {
                node.runtime.status = status;
                node.runtime.is_dirty = status == NodeStatus::Dirty;
            }
        }
        for edge in &mut document.edges {
            if let Some(&status) = self.edge_statuses.get(&edge.id) {
                edge.status = status;
            }
        }

        document
    }

    /// The dirty part of the session's graph
    pub fn dirty_subgraph(&self) -> DirtySubgraph {
        let document = self.to_document(&DocumentInfo::default());
        compute_dirty_subgraph(&document.nodes, &document.edges)
    }

    /// Execution plan for a partial run over the dirty nodes
    pub fn plan_dirty(&self) -> ExecutionPlan {
        plan_subgraph(&self.dirty_subgraph())
    }

    fn emit(&self, event: GraphEvent) {
        if let Err(e) = self.events.send(event) {
            log::warn!("Failed to deliver graph event: {}", e);
        }
    }
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new()
    }
}
