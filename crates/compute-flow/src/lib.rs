//! Compute Flow - typed workflow graphs for generative pipelines
//!
//! This crate models a workflow as a directed graph of typed nodes (text,
//! image, video, transform, model, output, gateway) joined by edges between
//! typed ports. It does not run anything itself. It provides:
//!
//! - Connection validation (direction, type compatibility, cardinality, cycles)
//! - Dirty tracking so only stale nodes re-run after an edit
//! - Execution planning (Kahn's algorithm with cycle reporting)
//! - Conversion between the editor's working format and the portable document
//! - Document completeness checks before a run
//!
//! # Architecture
//!
//! - [`types`]: the portable `ComputeGraphDocument` and everything in it
//! - [`working`]: the editor's block/connection shape, converted by [`serializer`]
//! - [`graph_view`]: adjacency shared by validation, dirty tracking and planning
//! - [`session`]: `EditSession`, the stateful editing surface
//!
//! # Example
//!
//! ```
//! use compute_flow::{plan, DocumentBuilder, NodeKind};
//!
//! let doc = DocumentBuilder::new("Poster")
//!     .add_node("prompt", NodeKind::Text, (0.0, 0.0))
//!     .add_node("img", NodeKind::Image, (200.0, 0.0))
//!     .add_node("out", NodeKind::Output, (400.0, 0.0))
//!     .add_edge("prompt", "prompt-output-0", "img", "img-input-0")
//!     .add_edge("img", "img-output-0", "out", "out-input-0")
//!     .build();
//!
//! let plan = plan(&doc).unwrap();
//! assert_eq!(plan.execution_order, vec!["prompt", "img", "out"]);
//! ```

pub mod builder;
pub mod config;
pub mod connection;
pub mod dirty;
pub mod error;
pub mod events;
pub mod graph_view;
pub mod io;
pub mod plan;
pub mod runtime;
pub mod serializer;
pub mod session;
pub mod templates;
pub mod types;
pub mod working;

// Re-export key types
pub use builder::DocumentBuilder;
pub use config::SerializerConfig;
pub use connection::{validate_connection, validate_edge, ConnectionError, ConnectionVerdict};
pub use dirty::{compute_dirty_subgraph, mark_dirty_downstream, DirtySubgraph};
pub use error::{ComputeFlowError, Result};
pub use events::{EventSink, GraphEvent, NullEventSink, VecEventSink};
pub use graph_view::GraphView;
pub use io::{load_documents, read_document, write_document};
pub use plan::{plan, plan_graph, plan_subgraph, ExecutionPlan};
pub use runtime::{RunEvent, RunLog, RunLogLevel};
pub use serializer::{
    from_document, from_document_with_config, schema_matches, to_document, to_document_default,
    validate_document, DocumentInfo, DocumentValidation,
};
pub use session::EditSession;
pub use templates::{NodeTemplate, PortTemplate};
pub use types::{
    ArtifactRef, ArtifactType, Cardinality, ComputeGraphDocument, DataType, EdgeDefinition,
    EdgeStatus, NodeDefinition, NodeKind, NodeRuntimeState, NodeStatus, Port, PortRef, PortSide,
    Position,
};
pub use working::{Block, BlockConnection, BlockType, WorkingGraph};
