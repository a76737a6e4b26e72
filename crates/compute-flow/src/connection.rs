//! Connection validation
//!
//! Decides whether a proposed edge may be added to a graph. The check is
//! a pure function over the ports, the existing edges and the two node
//! IDs; adding the edge and marking nodes dirty is left to the caller.
//!
//! Rules are applied in order and the first failure wins:
//!
//! 1. no self-loop
//! 2. output-side source, input-side target
//! 3. compatible data types
//! 4. source port cardinality
//! 5. target port cardinality
//! 6. no cycle through the existing edges

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::graph_view::GraphView;
use crate::types::{Cardinality, DataType, EdgeDefinition, NodeDefinition, Port};

/// Reason a proposed connection was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("cannot connect node to itself")]
    SelfLoop,

    #[error("source port '{port}' is an input; connections must start at an output port")]
    SourceIsInput { port: String },

    #[error("target port '{port}' is an output; connections must end at an input port")]
    TargetIsOutput { port: String },

    #[error("type mismatch: cannot connect {from} to {to}")]
    TypeMismatch { from: DataType, to: DataType },

    #[error("source port already connected")]
    SourceAlreadyConnected,

    #[error("target port already connected")]
    TargetAlreadyConnected,

    #[error("cycle detected: connection would create a loop")]
    CycleDetected,

    /// The edge names a node or port that does not exist
    #[error("port '{port_id}' not found on node '{node_id}'")]
    UnknownPort { node_id: String, port_id: String },

    /// An identical connection is already present
    #[error("connection already exists")]
    Duplicate,

    /// Another connection already uses this ID
    #[error("connection id '{id}' is already in use")]
    DuplicateId { id: String },
}

/// Outcome of a connection check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionVerdict {
    pub valid: bool,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_error"
    )]
    pub error: Option<ConnectionError>,
}

impl ConnectionVerdict {
    pub fn accepted() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn rejected(error: ConnectionError) -> Self {
        Self {
            valid: false,
            error: Some(error),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Human-readable rejection message, if any
    pub fn message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

impl From<Result<(), ConnectionError>> for ConnectionVerdict {
    fn from(result: Result<(), ConnectionError>) -> Self {
        match result {
            Ok(()) => Self::accepted(),
            Err(error) => Self::rejected(error),
        }
    }
}

fn serialize_error<S: Serializer>(
    error: &Option<ConnectionError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match error {
        Some(error) => serializer.serialize_str(&error.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Check whether an edge from `source_port` to `target_port` may be added
pub fn validate_connection(
    source_port: &Port,
    target_port: &Port,
    existing_edges: &[EdgeDefinition],
    source_node_id: &str,
    target_node_id: &str,
) -> ConnectionVerdict {
    check_connection(
        source_port,
        target_port,
        existing_edges,
        source_node_id,
        target_node_id,
    )
    .into()
}

fn check_connection(
    source_port: &Port,
    target_port: &Port,
    existing_edges: &[EdgeDefinition],
    source_node_id: &str,
    target_node_id: &str,
) -> Result<(), ConnectionError> {
    if source_node_id == target_node_id {
        return Err(ConnectionError::SelfLoop);
    }

    if !source_port.is_output() {
        return Err(ConnectionError::SourceIsInput {
            port: source_port.id.clone(),
        });
    }
    if !target_port.is_input() {
        return Err(ConnectionError::TargetIsOutput {
            port: target_port.id.clone(),
        });
    }

    if !source_port.data_type.is_compatible_with(&target_port.data_type) {
        return Err(ConnectionError::TypeMismatch {
            from: source_port.data_type,
            to: target_port.data_type,
        });
    }

    if source_port.cardinality == Cardinality::One
        && existing_edges
            .iter()
            .any(|e| e.source.node_id == source_node_id && e.source.port_id == source_port.id)
    {
        return Err(ConnectionError::SourceAlreadyConnected);
    }

    if target_port.cardinality == Cardinality::One
        && existing_edges
            .iter()
            .any(|e| e.target.node_id == target_node_id && e.target.port_id == target_port.id)
    {
        return Err(ConnectionError::TargetAlreadyConnected);
    }

    // A path target -> source means source -> target would close a loop
    if GraphView::from_edges(existing_edges).reaches(target_node_id, source_node_id) {
        return Err(ConnectionError::CycleDetected);
    }

    Ok(())
}

/// Check a fully-specified edge against the nodes and edges of a graph
///
/// Resolves both endpoints to their ports first; an endpoint that does
/// not resolve is rejected with [`ConnectionError::UnknownPort`].
pub fn validate_edge(
    edge: &EdgeDefinition,
    nodes: &[NodeDefinition],
    existing_edges: &[EdgeDefinition],
) -> ConnectionVerdict {
    let resolve = |node_id: &str, port_id: &str| {
        nodes
            .iter()
            .find(|n| n.id == node_id)
            .and_then(|n| n.find_port(port_id))
            .ok_or_else(|| ConnectionError::UnknownPort {
                node_id: node_id.to_string(),
                port_id: port_id.to_string(),
            })
    };

    let source_port = match resolve(&edge.source.node_id, &edge.source.port_id) {
        Ok(port) => port,
        Err(error) => return ConnectionVerdict::rejected(error),
    };
    let target_port = match resolve(&edge.target.node_id, &edge.target.port_id) {
        Ok(port) => port,
        Err(error) => return ConnectionVerdict::rejected(error),
    };

    validate_connection(
        source_port,
        target_port,
        existing_edges,
        &edge.source.node_id,
        &edge.target.node_id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PortRef, PortSide};

    fn port(id: &str, data_type: DataType, cardinality: Cardinality, side: PortSide) -> Port {
        Port {
            id: id.to_string(),
            name: id.to_string(),
            data_type,
            cardinality,
            optional: false,
            side,
        }
    }

    fn output(data_type: DataType) -> Port {
        port("out", data_type, Cardinality::Many, PortSide::Right)
    }

    fn input(data_type: DataType) -> Port {
        port("in", data_type, Cardinality::Many, PortSide::Left)
    }

    fn edge(id: &str, from: &str, to: &str) -> EdgeDefinition {
        EdgeDefinition::new(
            id,
            PortRef::new(from, "out"),
            PortRef::new(to, "in"),
            DataType::Any,
        )
    }

    #[test]
    fn test_self_loop_always_rejected() {
        for data_type in DataType::ALL {
            let verdict =
                validate_connection(&output(data_type), &input(data_type), &[], "a", "a");
            assert_eq!(verdict.error, Some(ConnectionError::SelfLoop));
        }

        // Even with backwards ports the self-loop rule fires first
        let verdict = validate_connection(
            &input(DataType::Text),
            &output(DataType::Text),
            &[],
            "a",
            "a",
        );
        assert_eq!(verdict.message().as_deref(), Some("cannot connect node to itself"));
    }

    #[test]
    fn test_direction() {
        let verdict = validate_connection(
            &input(DataType::Image),
            &input(DataType::Image),
            &[],
            "a",
            "b",
        );
        assert!(matches!(verdict.error, Some(ConnectionError::SourceIsInput { .. })));

        let verdict = validate_connection(
            &output(DataType::Image),
            &output(DataType::Image),
            &[],
            "a",
            "b",
        );
        assert!(matches!(verdict.error, Some(ConnectionError::TargetIsOutput { .. })));

        let top = port("in", DataType::Image, Cardinality::One, PortSide::Top);
        let bottom = port("out", DataType::Image, Cardinality::Many, PortSide::Bottom);
        assert!(validate_connection(&bottom, &top, &[], "a", "b").is_valid());
    }

    #[test]
    fn test_type_compatibility_matrix() {
        for from in DataType::ALL {
            for to in DataType::ALL {
                let expected = from == DataType::Any
                    || to == DataType::Any
                    || from == DataType::Text
                    || from == to;
                let verdict = validate_connection(&output(from), &input(to), &[], "a", "b");
                assert_eq!(verdict.valid, expected, "{from} -> {to}");
                if !expected {
                    assert_eq!(
                        verdict.message(),
                        Some(format!("type mismatch: cannot connect {from} to {to}"))
                    );
                }
            }
        }
    }

    #[test]
    fn test_type_compatibility_examples() {
        let check = |from, to| validate_connection(&output(from), &input(to), &[], "a", "b").valid;
        assert!(check(DataType::Text, DataType::Image));
        assert!(!check(DataType::Image, DataType::Video));
        assert!(check(DataType::Image, DataType::Image));
        assert!(check(DataType::Any, DataType::Video));
        assert!(check(DataType::Tensor, DataType::Any));
        // The text rule is one-directional
        assert!(!check(DataType::Image, DataType::Text));
    }

    #[test]
    fn test_source_cardinality_one() {
        let source = port("out", DataType::Text, Cardinality::One, PortSide::Right);
        let existing = vec![edge("e1", "a", "b")];

        let verdict = validate_connection(&source, &input(DataType::Text), &existing, "a", "c");
        assert_eq!(verdict.error, Some(ConnectionError::SourceAlreadyConnected));

        // Same port ID on a different node is unaffected
        let verdict = validate_connection(&source, &input(DataType::Text), &existing, "x", "c");
        assert!(verdict.valid);
    }

    #[test]
    fn test_target_cardinality_one() {
        let target = port("in", DataType::Text, Cardinality::One, PortSide::Left);
        let existing = vec![edge("e1", "a", "b")];

        let verdict = validate_connection(&output(DataType::Text), &target, &existing, "c", "b");
        assert_eq!(verdict.error, Some(ConnectionError::TargetAlreadyConnected));

        let many = input(DataType::Text);
        assert!(validate_connection(&output(DataType::Text), &many, &existing, "c", "b").valid);
    }

    #[test]
    fn test_cycle_rejection() {
        let existing = vec![edge("e1", "a", "b"), edge("e2", "b", "c")];
        let out = output(DataType::Any);
        let inp = input(DataType::Any);

        let verdict = validate_connection(&out, &inp, &existing, "c", "a");
        assert_eq!(verdict.error, Some(ConnectionError::CycleDetected));

        let verdict = validate_connection(&out, &inp, &existing, "c", "d");
        assert!(verdict.valid);
    }

    #[test]
    fn test_rule_order_type_before_cardinality() {
        let source = port("out", DataType::Image, Cardinality::One, PortSide::Right);
        let existing = vec![edge("e1", "a", "b")];
        let verdict = validate_connection(&source, &input(DataType::Video), &existing, "a", "c");
        assert!(matches!(verdict.error, Some(ConnectionError::TypeMismatch { .. })));
    }

    #[test]
    fn test_verdict_serialization() {
        let json = serde_json::to_value(ConnectionVerdict::accepted()).unwrap();
        assert_eq!(json, serde_json::json!({"valid": true}));

        let verdict = ConnectionVerdict::rejected(ConnectionError::CycleDetected);
        let json = serde_json::to_value(verdict).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "valid": false,
                "error": "cycle detected: connection would create a loop"
            })
        );
    }

    #[test]
    fn test_validate_edge_resolves_ports() {
        use crate::builder::DocumentBuilder;
        use crate::types::NodeKind;

        let doc = DocumentBuilder::new("test")
            .add_node("img", NodeKind::Image, (0.0, 0.0))
            .add_node("vid", NodeKind::Video, (100.0, 0.0))
            .build();

        let ok = EdgeDefinition::new(
            "e1",
            PortRef::new("img", "img-output-0"),
            PortRef::new("vid", "vid-input-1"),
            DataType::Image,
        );
        assert!(validate_edge(&ok, &doc.nodes, &doc.edges).valid);

        let missing = EdgeDefinition::new(
            "e2",
            PortRef::new("img", "img-output-9"),
            PortRef::new("vid", "vid-input-1"),
            DataType::Image,
        );
        assert!(matches!(
            validate_edge(&missing, &doc.nodes, &doc.edges).error,
            Some(ConnectionError::UnknownPort { .. })
        ));
    }
}
