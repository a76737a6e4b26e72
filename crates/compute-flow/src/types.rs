//! Core types for compute graph documents
//!
//! These types define the portable shape of a workflow graph: nodes,
//! edges, ports, produced artifacts and the document envelope. Field
//! names follow the JSON document format (camelCase).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// Unique identifier for a port (scoped to its node)
pub type PortId = String;

/// Free-form parameter bag carried by nodes
pub type Params = serde_json::Map<String, serde_json::Value>;

/// The data type carried by a port or edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Image data
    Image,
    /// Text (prompts, captions, metadata payloads)
    Text,
    /// Video data
    Video,
    /// Generic tensor
    Tensor,
    /// JSON object
    Json,
    /// Accepts any type
    Any,
}

impl DataType {
    /// Every data type, in declaration order
    pub const ALL: [DataType; 6] = [
        DataType::Image,
        DataType::Text,
        DataType::Video,
        DataType::Tensor,
        DataType::Json,
        DataType::Any,
    ];

    /// Check if data of this type can flow into a port of `target` type
    ///
    /// `Any` on either side is compatible with everything. `Text` is a
    /// universal source: it may feed any input, but the reverse does not
    /// hold (`image -> text` is rejected while `text -> image` is allowed).
    pub fn is_compatible_with(&self, target: &DataType) -> bool {
        if matches!(self, DataType::Any) || matches!(target, DataType::Any) {
            return true;
        }

        if matches!(self, DataType::Text) {
            return true;
        }

        self == target
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Image => "image",
            DataType::Text => "text",
            DataType::Video => "video",
            DataType::Tensor => "tensor",
            DataType::Json => "json",
            DataType::Any => "any",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many edges may attach to a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    /// At most one edge
    #[serde(rename = "one", alias = "1")]
    One,
    /// Unbounded
    #[serde(rename = "many", alias = "n")]
    Many,
}

/// Side of the node a port sits on
///
/// The side determines direction: `Left`/`Top` are inputs,
/// `Right`/`Bottom` are outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortSide {
    Top,
    Right,
    Bottom,
    Left,
}

impl PortSide {
    pub fn is_input(&self) -> bool {
        matches!(self, PortSide::Left | PortSide::Top)
    }

    pub fn is_output(&self) -> bool {
        matches!(self, PortSide::Right | PortSide::Bottom)
    }
}

/// A typed attachment point on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Node-scoped identifier (e.g. `img1-input-0`)
    pub id: PortId,
    /// Display name
    pub name: String,
    /// Data type accepted or produced
    #[serde(rename = "datatype")]
    pub data_type: DataType,
    /// Connection limit
    pub cardinality: Cardinality,
    /// Whether an input may be left unconnected
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
    /// Side of the node, which also fixes direction
    #[serde(rename = "position")]
    pub side: PortSide,
}

impl Port {
    pub fn is_input(&self) -> bool {
        self.side.is_input()
    }

    pub fn is_output(&self) -> bool {
        self.side.is_output()
    }
}

/// The closed set of node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Image,
    Text,
    Video,
    Transform,
    Model,
    Output,
    Gateway,
}

impl NodeKind {
    pub const ALL: [NodeKind; 7] = [
        NodeKind::Image,
        NodeKind::Text,
        NodeKind::Video,
        NodeKind::Transform,
        NodeKind::Model,
        NodeKind::Output,
        NodeKind::Gateway,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Image => "Image",
            NodeKind::Text => "Text",
            NodeKind::Video => "Video",
            NodeKind::Transform => "Transform",
            NodeKind::Model => "Model",
            NodeKind::Output => "Output",
            NodeKind::Gateway => "Gateway",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Idle,
    Queued,
    Running,
    Succeeded,
    Failed,
    Canceled,
    /// Output is stale and must be recomputed
    Dirty,
}

/// Status of an edge during a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStatus {
    #[default]
    Idle,
    Running,
    Succeeded,
    Error,
}

/// 2D canvas position (presentation only)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Node size on the canvas (presentation only)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

/// Kind of a produced artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    Image,
    Video,
    Text,
    Json,
}

/// Opaque reference to a value produced by a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub id: String,
    #[serde(rename = "type")]
    pub artifact_type: ArtifactType,
    /// Location of the artifact, when stored externally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Inline artifact payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Params>,
}

/// Mutable runtime slice of a node
///
/// Written by the dirty tracker and by an external executor. Kept apart
/// from the structural definition so graph algorithms can work on
/// snapshots of the structure while status keeps changing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRuntimeState {
    #[serde(default)]
    pub status: NodeStatus,
    /// Progress in percent (0-100)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_dirty: bool,
    /// Latest artifact produced by the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<ArtifactRef>,
}

impl NodeRuntimeState {
    /// Whether the node's output is considered stale
    pub fn is_stale(&self) -> bool {
        self.is_dirty || self.status == NodeStatus::Dirty
    }
}

/// A node instance in a compute graph document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDefinition {
    /// Unique identifier within the graph
    pub id: NodeId,
    pub kind: NodeKind,
    /// Semantic version of the kind's port template
    pub version: String,
    pub label: String,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
    #[serde(default)]
    pub params: Params,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Params>,
    #[serde(flatten)]
    pub runtime: NodeRuntimeState,
}

impl NodeDefinition {
    /// Find an input port by ID
    pub fn find_input(&self, port_id: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.id == port_id)
    }

    /// Find an output port by ID
    pub fn find_output(&self, port_id: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.id == port_id)
    }

    /// Find a port on either side by ID
    pub fn find_port(&self, port_id: &str) -> Option<&Port> {
        self.find_input(port_id).or_else(|| self.find_output(port_id))
    }

    pub fn is_stale(&self) -> bool {
        self.runtime.is_stale()
    }
}

/// One end of an edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRef {
    pub node_id: NodeId,
    pub port_id: PortId,
}

impl PortRef {
    pub fn new(node_id: impl Into<String>, port_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            port_id: port_id.into(),
        }
    }
}

/// Optional edge annotations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
}

/// A directed connection from an output port to an input port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDefinition {
    pub id: EdgeId,
    pub source: PortRef,
    pub target: PortRef,
    /// Data type carried (mirrors the port types)
    pub data_type: DataType,
    #[serde(default)]
    pub status: EdgeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EdgeMetadata>,
}

impl EdgeDefinition {
    pub fn new(
        id: impl Into<String>,
        source: PortRef,
        target: PortRef,
        data_type: DataType,
    ) -> Self {
        Self {
            id: id.into(),
            source,
            target,
            data_type,
            status: EdgeStatus::Idle,
            metadata: None,
        }
    }

    /// Whether either endpoint belongs to the given node
    pub fn touches(&self, node_id: &str) -> bool {
        self.source.node_id == node_id || self.target.node_id == node_id
    }
}

/// Descriptive metadata of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
}

/// Viewport state (presentation only)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub zoom: f64,
    pub center: [f64; 2],
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            center: [0.0, 0.0],
        }
    }
}

/// The portable, serializable representation of a workflow graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeGraphDocument {
    pub schema_version: String,
    pub metadata: DocumentMetadata,
    pub nodes: Vec<NodeDefinition>,
    pub edges: Vec<EdgeDefinition>,
    #[serde(default)]
    pub view_state: ViewState,
}

impl ComputeGraphDocument {
    /// Find a node by ID
    pub fn find_node(&self, id: &str) -> Option<&NodeDefinition> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find a node by ID (mutable)
    pub fn find_node_mut(&mut self, id: &str) -> Option<&mut NodeDefinition> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Find an edge by ID
    pub fn find_edge(&self, id: &str) -> Option<&EdgeDefinition> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Get edges coming into a node
    pub fn incoming_edges<'a>(
        &'a self,
        node_id: &'a str,
    ) -> impl Iterator<Item = &'a EdgeDefinition> + 'a {
        self.edges.iter().filter(move |e| e.target.node_id == node_id)
    }

    /// Get edges going out of a node
    pub fn outgoing_edges<'a>(
        &'a self,
        node_id: &'a str,
    ) -> impl Iterator<Item = &'a EdgeDefinition> + 'a {
        self.edges.iter().filter(move |e| e.source.node_id == node_id)
    }

    /// Nodes of the given kind
    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &NodeDefinition> + '_ {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }
}
