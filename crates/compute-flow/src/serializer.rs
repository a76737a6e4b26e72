//! Conversion between the editor working format and documents
//!
//! [`to_document`] and [`from_document`] are pure mappings between a
//! [`WorkingGraph`] and a [`ComputeGraphDocument`]. [`validate_document`]
//! checks that a document is complete enough to execute and returns
//! every problem it finds.

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::SerializerConfig;
use crate::templates::NodeTemplate;
use crate::types::{
    ComputeGraphDocument, DocumentMetadata, EdgeDefinition, NodeDefinition, NodeKind,
    NodeRuntimeState, PortRef, PortSide,
};
use crate::working::{Block, BlockConnection, BlockType, WorkingGraph};

/// Caller-supplied document metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Author recorded as `createdBy`
    pub author: Option<String>,
}

impl DocumentInfo {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// Result of [`validate_document`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Convert the working format into a portable document
pub fn to_document(
    graph: &WorkingGraph,
    info: &DocumentInfo,
    config: &SerializerConfig,
) -> ComputeGraphDocument {
    let now = Utc::now();
    ComputeGraphDocument {
        schema_version: config.schema_version.clone(),
        metadata: DocumentMetadata {
            title: info
                .title
                .clone()
                .unwrap_or_else(|| config.default_title.clone()),
            description: info.description.clone(),
            created_at: now,
            updated_at: now,
            created_by: info
                .author
                .clone()
                .unwrap_or_else(|| config.default_author.clone()),
        },
        nodes: graph.blocks.values().map(|b| to_node(b, config)).collect(),
        edges: to_edges(&graph.connections),
        view_state: config.view_state,
    }
}

/// [`to_document`] with the default configuration
pub fn to_document_default(graph: &WorkingGraph, info: &DocumentInfo) -> ComputeGraphDocument {
    to_document(graph, info, &SerializerConfig::default())
}

/// Convert one block into a node with templated ports
pub fn to_node(block: &Block, config: &SerializerConfig) -> NodeDefinition {
    let kind = block.block_type.kind();
    let (inputs, outputs) = NodeTemplate::for_kind(kind).instantiate(&block.id);

    NodeDefinition {
        id: block.id.clone(),
        kind,
        version: config.node_version.clone(),
        label: block_label(block, kind),
        position: block.position,
        size: None,
        inputs,
        outputs,
        params: block.inputs.clone(),
        metadata: None,
        runtime: NodeRuntimeState::default(),
    }
}

fn block_label(block: &Block, kind: NodeKind) -> String {
    block
        .inputs
        .get("prompt")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} Block", kind))
}

/// Convert one connection into an edge
///
/// Connections without explicit port IDs are bound to the first output
/// of the source and the first input of the target.
pub fn to_edge(connection: &BlockConnection) -> EdgeDefinition {
    let source_port = connection.resolved_source_port();
    if connection.source_point_id.is_none() {
        log::warn!(
            "Connection '{}' has no source port ID; defaulting to '{}'",
            connection.id,
            source_port
        );
    }
    let target_port = connection.resolved_target_port();
    if connection.target_point_id.is_none() {
        log::warn!(
            "Connection '{}' has no target port ID; defaulting to '{}'",
            connection.id,
            target_port
        );
    }

    EdgeDefinition::new(
        connection.id.clone(),
        PortRef::new(connection.source_block_id.clone(), source_port),
        PortRef::new(connection.target_block_id.clone(), target_port),
        connection.data_type,
    )
}

/// Convert a list of connections into edges
pub fn to_edges(connections: &[BlockConnection]) -> Vec<EdgeDefinition> {
    connections.iter().map(to_edge).collect()
}

/// Convert a document back into the working format
///
/// Presentation-only fields the document does not carry (connection
/// sides, block outputs) get default values.
pub fn from_document(document: &ComputeGraphDocument) -> WorkingGraph {
    from_document_with_config(document, &SerializerConfig::default())
}

/// [`from_document`] checking the schema version against `config`
pub fn from_document_with_config(
    document: &ComputeGraphDocument,
    config: &SerializerConfig,
) -> WorkingGraph {
    if !schema_matches(document, config) {
        log::warn!(
            "Loading document with schema version '{}' (expected '{}'); no migration is applied",
            document.schema_version,
            config.schema_version
        );
    }

    let mut graph = WorkingGraph::new();
    for node in &document.nodes {
        let mut block = Block::new(node.id.clone(), BlockType::from(node.kind), node.position);
        block.inputs = node.params.clone();
        graph.insert_block(block);
    }

    graph.connections = document
        .edges
        .iter()
        .map(|edge| BlockConnection {
            id: edge.id.clone(),
            source_block_id: edge.source.node_id.clone(),
            target_block_id: edge.target.node_id.clone(),
            source_point: PortSide::Right,
            target_point: PortSide::Left,
            data_type: edge.data_type,
            source_point_id: Some(edge.source.port_id.clone()),
            target_point_id: Some(edge.target.port_id.clone()),
        })
        .collect();

    graph
}

/// Whether a document was written with the configured schema version
pub fn schema_matches(document: &ComputeGraphDocument, config: &SerializerConfig) -> bool {
    document.schema_version == config.schema_version
}

/// Check that a document is structurally complete for execution
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_document(document: &ComputeGraphDocument) -> DocumentValidation {
    let mut errors = Vec::new();

    if document.nodes_of_kind(NodeKind::Output).next().is_none() {
        errors.push("workflow must have at least one Output node".to_string());
    }

    validate_required_inputs(document, &mut errors);
    validate_connectivity(document, &mut errors);
    validate_edge_references(document, &mut errors);

    DocumentValidation {
        valid: errors.is_empty(),
        errors,
    }
}

/// Every non-optional input needs at least one incoming edge
fn validate_required_inputs(document: &ComputeGraphDocument, errors: &mut Vec<String>) {
    let connected_inputs: HashSet<(&str, &str)> = document
        .edges
        .iter()
        .map(|e| (e.target.node_id.as_str(), e.target.port_id.as_str()))
        .collect();

    for node in &document.nodes {
        for port in node.inputs.iter().filter(|p| !p.optional) {
            if !connected_inputs.contains(&(node.id.as_str(), port.id.as_str())) {
                errors.push(format!(
                    "node '{}' is missing required input '{}'",
                    node.label, port.name
                ));
            }
        }
    }
}

/// Every non-Output node must take part in at least one edge
fn validate_connectivity(document: &ComputeGraphDocument, errors: &mut Vec<String>) {
    let connected: HashSet<&str> = document
        .edges
        .iter()
        .flat_map(|e| [e.source.node_id.as_str(), e.target.node_id.as_str()])
        .collect();

    for node in &document.nodes {
        if node.kind != NodeKind::Output && !connected.contains(node.id.as_str()) {
            errors.push(format!(
                "node '{}' is not connected to the workflow",
                node.label
            ));
        }
    }
}

/// Edge endpoints must resolve to a node and a port of the right direction
fn validate_edge_references(document: &ComputeGraphDocument, errors: &mut Vec<String>) {
    for edge in &document.edges {
        match document.find_node(&edge.source.node_id) {
            None => errors.push(format!(
                "edge '{}' references unknown node '{}'",
                edge.id, edge.source.node_id
            )),
            Some(node) if node.find_output(&edge.source.port_id).is_none() => {
                errors.push(format!(
                    "edge '{}' references unknown port '{}' on node '{}'",
                    edge.id, edge.source.port_id, edge.source.node_id
                ))
            }
            Some(_) => {}
        }

        match document.find_node(&edge.target.node_id) {
            None => errors.push(format!(
                "edge '{}' references unknown node '{}'",
                edge.id, edge.target.node_id
            )),
            Some(node) if node.find_input(&edge.target.port_id).is_none() => {
                errors.push(format!(
                    "edge '{}' references unknown port '{}' on node '{}'",
                    edge.id, edge.target.port_id, edge.target.node_id
                ))
            }
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DocumentBuilder;
    use crate::config::defaults;
    use crate::plan::plan;
    use crate::types::DataType;

    fn working_graph() -> WorkingGraph {
        let mut graph = WorkingGraph::new();

        let mut prompt = Block::new("p1", BlockType::Text, (0.0, 0.0));
        prompt.inputs.insert("prompt".into(), serde_json::json!("a red fox"));
        prompt.inputs.insert("temperature".into(), serde_json::json!(0.7));
        graph.insert_block(prompt);

        let mut image = Block::new("i1", BlockType::Image, (150.0, 0.0));
        image.inputs.insert("model".into(), serde_json::json!("flux"));
        graph.insert_block(image);

        graph.insert_block(Block::new("o1", BlockType::Output, (300.0, 0.0)));

        graph.connections.push(BlockConnection::new(
            "p1",
            "p1-output-0",
            "i1",
            "i1-input-0",
            DataType::Text,
        ));
        graph.connections.push(BlockConnection::new(
            "i1",
            "i1-output-0",
            "o1",
            "o1-input-0",
            DataType::Image,
        ));
        graph
    }

    #[test]
    fn test_to_document_templates_ports() {
        let doc = to_document_default(&working_graph(), &DocumentInfo::titled("Fox"));

        assert_eq!(doc.schema_version, defaults::SCHEMA_VERSION);
        assert_eq!(doc.metadata.title, "Fox");
        assert_eq!(doc.metadata.created_by, defaults::AUTHOR);

        let image = doc.find_node("i1").unwrap();
        assert_eq!(image.kind, NodeKind::Image);
        assert_eq!(image.inputs[0].id, "i1-input-0");
        assert_eq!(image.inputs[1].id, "i1-input-1");
        assert_eq!(image.outputs[1].id, "i1-output-1");
        assert_eq!(image.label, "Image Block");
        assert_eq!(image.params["model"], serde_json::json!("flux"));

        let prompt = doc.find_node("p1").unwrap();
        assert_eq!(prompt.label, "a red fox");
    }

    #[test]
    fn test_to_document_uses_config_defaults() {
        let config = SerializerConfig {
            default_title: "Scratch".to_string(),
            default_author: "studio".to_string(),
            ..SerializerConfig::default()
        };
        let doc = to_document(&working_graph(), &DocumentInfo::default(), &config);
        assert_eq!(doc.metadata.title, "Scratch");
        assert_eq!(doc.metadata.created_by, "studio");
        assert_eq!(doc.view_state.zoom, 1.0);
    }

    #[test]
    fn test_legacy_connection_defaults_to_first_ports() {
        let mut graph = working_graph();
        for conn in &mut graph.connections {
            conn.source_point_id = None;
            conn.target_point_id = None;
        }

        let doc = to_document_default(&graph, &DocumentInfo::default());
        let edge = &doc.edges[0];
        assert_eq!(edge.source.port_id, "p1-output-0");
        assert_eq!(edge.target.port_id, "i1-input-0");
        assert!(validate_document(&doc).valid);
    }

    #[test]
    fn test_round_trip_preserves_params_and_edges() {
        let original = working_graph();
        let restored = from_document(&to_document_default(&original, &DocumentInfo::default()));

        assert_eq!(restored.blocks.len(), original.blocks.len());
        for (id, block) in &original.blocks {
            let back = restored.block(id).unwrap();
            assert_eq!(back.inputs, block.inputs);
            assert_eq!(back.block_type, block.block_type);
            assert_eq!(back.position, block.position);
        }

        assert_eq!(restored.connections.len(), original.connections.len());
        for (back, conn) in restored.connections.iter().zip(&original.connections) {
            assert_eq!(back.id, conn.id);
            assert_eq!(back.source_block_id, conn.source_block_id);
            assert_eq!(back.target_block_id, conn.target_block_id);
            assert_eq!(back.source_point_id, conn.source_point_id);
            assert_eq!(back.target_point_id, conn.target_point_id);
        }
    }

    #[test]
    fn test_schema_version_checked_against_config() {
        let mut doc = to_document_default(&working_graph(), &DocumentInfo::default());
        doc.schema_version = "2.0.0".to_string();

        let default_config = SerializerConfig::default();
        let v2_config = SerializerConfig {
            schema_version: "2.0.0".to_string(),
            ..SerializerConfig::default()
        };
        assert!(!schema_matches(&doc, &default_config));
        assert!(schema_matches(&doc, &v2_config));

        // A mismatch is reported but the document still loads
        let graph = from_document_with_config(&doc, &default_config);
        assert_eq!(graph, from_document_with_config(&doc, &v2_config));
        assert_eq!(graph.blocks.len(), 3);
    }

    #[test]
    fn test_validate_requires_output_node() {
        let doc = DocumentBuilder::new("No output")
            .add_node("a", NodeKind::Text, (0.0, 0.0))
            .add_node("b", NodeKind::Image, (100.0, 0.0))
            .add_edge("a", "a-output-0", "b", "b-input-0")
            .build();

        let result = validate_document(&doc);
        assert!(!result.valid);
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("must have at least one Output node")));
    }

    #[test]
    fn test_validate_missing_required_input() {
        let doc = DocumentBuilder::new("Missing prompt")
            .add_node("m1", NodeKind::Model, (0.0, 0.0))
            .with_label("Captioner")
            .add_node("o1", NodeKind::Output, (100.0, 0.0))
            .add_edge("m1", "m1-output-0", "o1", "o1-input-0")
            .build();

        let result = validate_document(&doc);
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec!["node 'Captioner' is missing required input 'prompt'"]
        );
    }

    #[test]
    fn test_validate_disconnected_node() {
        let doc = DocumentBuilder::new("Island")
            .add_node("p1", NodeKind::Text, (0.0, 0.0))
            .add_node("lonely", NodeKind::Image, (0.0, 100.0))
            .with_label("Lonely")
            .add_node("o1", NodeKind::Output, (100.0, 0.0))
            .add_edge("p1", "p1-output-0", "o1", "o1-input-0")
            .build();

        let result = validate_document(&doc);
        assert_eq!(
            result.errors,
            vec!["node 'Lonely' is not connected to the workflow"]
        );
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let doc = DocumentBuilder::new("Empty-ish")
            .add_node("m1", NodeKind::Model, (0.0, 0.0))
            .build();

        let result = validate_document(&doc);
        assert_eq!(result.errors.len(), 3);
    }

    #[test]
    fn test_validate_dangling_edge() {
        let doc = DocumentBuilder::new("Dangling")
            .add_node("p1", NodeKind::Text, (0.0, 0.0))
            .add_node("o1", NodeKind::Output, (100.0, 0.0))
            .add_edge_with_id("e1", "p1", "p1-output-0", "o1", "o1-input-0")
            .add_edge_with_id("e2", "p1", "p1-input-0", "ghost", "ghost-input-0")
            .build();

        let result = validate_document(&doc);
        assert_eq!(
            result.errors,
            vec![
                "edge 'e2' references unknown port 'p1-input-0' on node 'p1'",
                "edge 'e2' references unknown node 'ghost'",
            ]
        );
    }

    #[test]
    fn test_concrete_text_to_output_scenario() {
        let doc = DocumentBuilder::new("Scenario")
            .add_node("p1", NodeKind::Text, (0.0, 0.0))
            .add_node("o1", NodeKind::Output, (200.0, 0.0))
            .add_edge("p1", "p1-output-0", "o1", "o1-input-0")
            .build();

        let validation = validate_document(&doc);
        assert_eq!(
            validation,
            DocumentValidation {
                valid: true,
                errors: vec![]
            }
        );

        let plan = plan(&doc).unwrap();
        assert_eq!(plan.execution_order, vec!["p1", "o1"]);
        assert!(plan.cycles.is_empty());
    }
}
