//! Editor working format
//!
//! The editing surface keeps its own shape of the graph: blocks keyed by
//! ID with a loose settings bag, plus a flat list of connections that may
//! or may not record explicit port IDs. It is only ever turned into a
//! [`ComputeGraphDocument`](crate::types::ComputeGraphDocument) through
//! [`crate::serializer`]; validation and planning never read it directly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::templates::{input_port_id, output_port_id};
use crate::types::{DataType, NodeId, NodeKind, Params, PortId, PortSide, Position};

/// Type tag of a block in the working format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    Text,
    Image,
    Video,
    Transform,
    Model,
    Output,
    Gateway,
}

impl BlockType {
    /// Node kind this block serializes to
    pub fn kind(&self) -> NodeKind {
        match self {
            BlockType::Text => NodeKind::Text,
            BlockType::Image => NodeKind::Image,
            BlockType::Video => NodeKind::Video,
            BlockType::Transform => NodeKind::Transform,
            BlockType::Model => NodeKind::Model,
            BlockType::Output => NodeKind::Output,
            BlockType::Gateway => NodeKind::Gateway,
        }
    }
}

impl From<NodeKind> for BlockType {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Text => BlockType::Text,
            NodeKind::Image => BlockType::Image,
            NodeKind::Video => BlockType::Video,
            NodeKind::Transform => BlockType::Transform,
            NodeKind::Model => BlockType::Model,
            NodeKind::Output => BlockType::Output,
            NodeKind::Gateway => BlockType::Gateway,
        }
    }
}

/// A node as the editor holds it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    pub position: Position,
    /// Per-block settings (prompt, model options, ...) plus values
    /// received from upstream outputs, keyed by input port
    #[serde(default)]
    pub inputs: Params,
    /// Last produced values, keyed by output port
    #[serde(default)]
    pub outputs: Params,
}

impl Block {
    pub fn new(
        id: impl Into<String>,
        block_type: BlockType,
        position: impl Into<Position>,
    ) -> Self {
        Self {
            id: id.into(),
            block_type,
            position: position.into(),
            inputs: Params::new(),
            outputs: Params::new(),
        }
    }
}

/// A connection as the editor holds it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockConnection {
    pub id: String,
    pub source_block_id: NodeId,
    pub target_block_id: NodeId,
    /// Side the connection leaves the source from
    pub source_point: PortSide,
    /// Side the connection enters the target at
    pub target_point: PortSide,
    pub data_type: DataType,
    /// Source port ID; absent on records from older editors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_point_id: Option<PortId>,
    /// Target port ID; absent on records from older editors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_point_id: Option<PortId>,
}

impl BlockConnection {
    /// Create a connection between two explicit ports with a fresh ID
    pub fn new(
        source_block_id: impl Into<String>,
        source_point_id: impl Into<String>,
        target_block_id: impl Into<String>,
        target_point_id: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            source_block_id: source_block_id.into(),
            target_block_id: target_block_id.into(),
            source_point: PortSide::Right,
            target_point: PortSide::Left,
            data_type,
            source_point_id: Some(source_point_id.into()),
            target_point_id: Some(target_point_id.into()),
        }
    }

    /// Whether both connections join the same blocks through the same ports
    pub fn same_endpoints(&self, other: &BlockConnection) -> bool {
        self.source_block_id == other.source_block_id
            && self.source_point_id == other.source_point_id
            && self.target_block_id == other.target_block_id
            && self.target_point_id == other.target_point_id
    }

    /// Source port ID, defaulting to the source block's first output
    pub fn resolved_source_port(&self) -> PortId {
        self.source_point_id
            .clone()
            .unwrap_or_else(|| output_port_id(&self.source_block_id, 0))
    }

    /// Target port ID, defaulting to the target block's first input
    pub fn resolved_target_port(&self) -> PortId {
        self.target_point_id
            .clone()
            .unwrap_or_else(|| input_port_id(&self.target_block_id, 0))
    }

    pub fn touches(&self, block_id: &str) -> bool {
        self.source_block_id == block_id || self.target_block_id == block_id
    }
}

/// The editor's graph: blocks keyed by ID plus the connection list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkingGraph {
    pub blocks: BTreeMap<NodeId, Block>,
    pub connections: Vec<BlockConnection>,
}

impl WorkingGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a block
    pub fn insert_block(&mut self, block: Block) {
        self.blocks.insert(block.id.clone(), block);
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn block_mut(&mut self, id: &str) -> Option<&mut Block> {
        self.blocks.get_mut(id)
    }

    /// Remove a block and every connection touching it
    pub fn remove_block(&mut self, id: &str) -> Option<Block> {
        let removed = self.blocks.remove(id)?;
        self.connections.retain(|c| !c.touches(id));
        Some(removed)
    }

    /// Whether an identical connection is already present
    pub fn has_connection(&self, connection: &BlockConnection) -> bool {
        self.connections.iter().any(|c| c.same_endpoints(connection))
    }

    /// Find a connection by ID
    pub fn connection(&self, id: &str) -> Option<&BlockConnection> {
        self.connections.iter().find(|c| c.id == id)
    }

    /// Remove a connection by ID
    pub fn remove_connection(&mut self, id: &str) -> Option<BlockConnection> {
        let pos = self.connections.iter().position(|c| c.id == id)?;
        Some(self.connections.remove(pos))
    }
}
