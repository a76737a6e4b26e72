//! Fluent builder for compute graph documents
//!
//! Provides a fluent API for constructing documents programmatically.
//! Nodes get their ports from the kind template; edges take their data
//! type from the source port when it resolves.

use chrono::Utc;

use crate::config::defaults;
use crate::templates::NodeTemplate;
use crate::types::{
    ComputeGraphDocument, DataType, DocumentMetadata, EdgeDefinition, NodeDefinition, NodeKind,
    NodeRuntimeState, Params, PortRef, Position, ViewState,
};

/// Fluent builder for constructing compute graph documents
///
/// # Example
///
/// ```ignore
/// let doc = DocumentBuilder::new("Poster")
///     .add_node("p1", NodeKind::Text, (0.0, 0.0))
///     .with_params(serde_json::json!({"prompt": "a lighthouse"}))
///     .add_node("o1", NodeKind::Output, (200.0, 0.0))
///     .add_edge("p1", "p1-output-0", "o1", "o1-input-0")
///     .build();
/// ```
pub struct DocumentBuilder {
    title: String,
    description: Option<String>,
    author: String,
    nodes: Vec<NodeDefinition>,
    edges: Vec<EdgeDefinition>,
    edge_counter: usize,
}

impl DocumentBuilder {
    /// Create a new document builder
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            author: defaults::AUTHOR.to_string(),
            nodes: Vec::new(),
            edges: Vec::new(),
            edge_counter: 0,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the author
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Add a node with ports instantiated from its kind's template
    pub fn add_node(
        mut self,
        id: impl Into<String>,
        kind: NodeKind,
        position: impl Into<Position>,
    ) -> Self {
        let id = id.into();
        let (inputs, outputs) = NodeTemplate::for_kind(kind).instantiate(&id);
        self.nodes.push(NodeDefinition {
            label: id.clone(),
            id,
            kind,
            version: defaults::NODE_VERSION.to_string(),
            position: position.into(),
            size: None,
            inputs,
            outputs,
            params: Params::new(),
            metadata: None,
            runtime: NodeRuntimeState::default(),
        });
        self
    }

    /// Set params on the most recently added node
    ///
    /// Non-object values are ignored. Must be called right after `add_node`.
    pub fn with_params(mut self, params: serde_json::Value) -> Self {
        if let (Some(node), serde_json::Value::Object(map)) = (self.nodes.last_mut(), params) {
            node.params = map;
        }
        self
    }

    /// Set the label of the most recently added node
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.label = label.into();
        }
        self
    }

    /// Mark the most recently added node dirty
    pub fn dirty(mut self) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.runtime.is_dirty = true;
        }
        self
    }

    /// Add an edge between two ports (auto-generates edge ID)
    pub fn add_edge(
        mut self,
        source: impl Into<String>,
        source_port: impl Into<String>,
        target: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        self.edge_counter += 1;
        let id = format!("edge-{}", self.edge_counter);
        self.push_edge(id, source.into(), source_port.into(), target.into(), target_port.into());
        self
    }

    /// Add an edge with an explicit ID
    pub fn add_edge_with_id(
        mut self,
        edge_id: impl Into<String>,
        source: impl Into<String>,
        source_port: impl Into<String>,
        target: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        self.push_edge(
            edge_id.into(),
            source.into(),
            source_port.into(),
            target.into(),
            target_port.into(),
        );
        self
    }

    fn push_edge(
        &mut self,
        id: String,
        source: String,
        source_port: String,
        target: String,
        target_port: String,
    ) {
        let data_type = self
            .nodes
            .iter()
            .find(|n| n.id == source)
            .and_then(|n| n.find_output(&source_port))
            .map(|p| p.data_type)
            .unwrap_or(DataType::Any);

        self.edges.push(EdgeDefinition::new(
            id,
            PortRef::new(source, source_port),
            PortRef::new(target, target_port),
            data_type,
        ));
    }

    /// Build the document without validation
    pub fn build(self) -> ComputeGraphDocument {
        let now = Utc::now();
        ComputeGraphDocument {
            schema_version: defaults::SCHEMA_VERSION.to_string(),
            metadata: DocumentMetadata {
                title: self.title,
                description: self.description,
                created_at: now,
                updated_at: now,
                created_by: self.author,
            },
            nodes: self.nodes,
            edges: self.edges,
            view_state: ViewState::default(),
        }
    }
}
