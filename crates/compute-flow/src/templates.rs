//! Port templates for each node kind
//!
//! Every [`NodeKind`] has a fixed set of input and output port shapes.
//! New nodes get their ports by instantiating the template for their
//! kind, which assigns node-scoped port IDs
//! (`{node_id}-input-{index}` / `{node_id}-output-{index}`).
//!
//! Templates are pure data. Whether an edge between two ports is
//! allowed is decided by [`crate::connection`].

use serde::{Deserialize, Serialize};

use crate::types::{Cardinality, DataType, NodeKind, Port, PortSide};

/// Shape of a port before it is bound to a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortTemplate {
    pub name: String,
    pub data_type: DataType,
    pub cardinality: Cardinality,
    pub optional: bool,
    pub side: PortSide,
}

impl PortTemplate {
    /// Create a new port template
    pub fn new(
        name: impl Into<String>,
        data_type: DataType,
        cardinality: Cardinality,
        optional: bool,
        side: PortSide,
    ) -> Self {
        Self {
            name: name.into(),
            data_type,
            cardinality,
            optional,
            side,
        }
    }

    /// A required single-connection port
    pub fn required(name: impl Into<String>, data_type: DataType, side: PortSide) -> Self {
        Self::new(name, data_type, Cardinality::One, false, side)
    }

    /// An optional single-connection port
    pub fn optional(name: impl Into<String>, data_type: DataType, side: PortSide) -> Self {
        Self::new(name, data_type, Cardinality::One, true, side)
    }

    /// Allow any number of connections on this port
    pub fn many(mut self) -> Self {
        self.cardinality = Cardinality::Many;
        self
    }

    /// Bind this template to a concrete port ID
    pub fn instantiate(&self, id: impl Into<String>) -> Port {
        Port {
            id: id.into(),
            name: self.name.clone(),
            data_type: self.data_type,
            cardinality: self.cardinality,
            optional: self.optional,
            side: self.side,
        }
    }
}

/// Input and output port shapes of a node kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTemplate {
    pub kind: NodeKind,
    pub inputs: Vec<PortTemplate>,
    pub outputs: Vec<PortTemplate>,
}

impl NodeTemplate {
    /// Template for the given node kind
    pub fn for_kind(kind: NodeKind) -> Self {
        use DataType::*;
        use PortSide::*;

        let (inputs, outputs) = match kind {
            NodeKind::Image => (
                vec![
                    PortTemplate::optional("prompt", Text, Left),
                    PortTemplate::optional("reference", Image, Top),
                ],
                vec![
                    PortTemplate::required("image", Image, Right).many(),
                    PortTemplate::required("metadata", Json, Bottom).many(),
                ],
            ),
            NodeKind::Text => (
                vec![
                    PortTemplate::optional("input", Text, Left),
                    PortTemplate::optional("context", Any, Top).many(),
                ],
                vec![PortTemplate::required("text", Text, Right).many()],
            ),
            NodeKind::Video => (
                vec![
                    PortTemplate::optional("prompt", Text, Left),
                    PortTemplate::optional("image", Image, Top),
                ],
                vec![PortTemplate::required("video", Video, Right).many()],
            ),
            NodeKind::Transform => (
                vec![PortTemplate::required("input", Any, Left).many()],
                vec![PortTemplate::required("output", Any, Right).many()],
            ),
            NodeKind::Model => (
                vec![
                    PortTemplate::required("prompt", Text, Left),
                    PortTemplate::optional("input", Any, Top),
                ],
                vec![PortTemplate::required("output", Any, Right).many()],
            ),
            NodeKind::Output => (
                vec![PortTemplate::required("input", Any, Left).many()],
                vec![],
            ),
            NodeKind::Gateway => (
                vec![PortTemplate::required("input", Any, Left).many()],
                vec![PortTemplate::required("output", Any, Right).many()],
            ),
        };

        Self {
            kind,
            inputs,
            outputs,
        }
    }

    /// Instantiate the input and output ports for a node
    pub fn instantiate(&self, node_id: &str) -> (Vec<Port>, Vec<Port>) {
        let inputs = self
            .inputs
            .iter()
            .enumerate()
            .map(|(idx, t)| t.instantiate(input_port_id(node_id, idx)))
            .collect();
        let outputs = self
            .outputs
            .iter()
            .enumerate()
            .map(|(idx, t)| t.instantiate(output_port_id(node_id, idx)))
            .collect();
        (inputs, outputs)
    }
}

/// Port ID of the `index`-th input on a node
pub fn input_port_id(node_id: &str, index: usize) -> String {
    format!("{}-input-{}", node_id, index)
}

/// Port ID of the `index`-th output on a node
pub fn output_port_id(node_id: &str, index: usize) -> String {
    format!("{}-output-{}", node_id, index)
}

/// Resolve a node-scoped port ID against a kind's template
///
/// Returns `None` when the ID does not name a port of that kind.
pub fn resolve_port(kind: NodeKind, node_id: &str, port_id: &str) -> Option<Port> {
    let (inputs, outputs) = NodeTemplate::for_kind(kind).instantiate(node_id);
    inputs
        .into_iter()
        .chain(outputs)
        .find(|port| port.id == port_id)
}
