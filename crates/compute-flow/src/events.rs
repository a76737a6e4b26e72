//! Event types for graph edits
//!
//! An [`EditSession`](crate::session::EditSession) reports accepted and
//! rejected connections, dirty propagation and status changes through an
//! [`EventSink`], so an editor can react without polling.

use serde::{Deserialize, Serialize};

use crate::types::{EdgeStatus, NodeStatus};

/// Trait for sending graph events
///
/// This abstracts over the transport mechanism (UI channel, mpsc, etc.)
/// allowing the engine to be used in different contexts.
pub trait EventSink: Send + Sync {
    /// Send an event
    ///
    /// Returns an error if the event could not be sent (e.g., channel closed)
    fn send(&self, event: GraphEvent) -> Result<(), EventError>;
}

/// Error when sending events fails
#[derive(Debug, Clone, thiserror::Error)]
#[error("Event error: {message}")]
pub struct EventError {
    pub message: String,
}

/// Events emitted while editing a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GraphEvent {
    /// A connection passed validation and was added
    #[serde(rename_all = "camelCase")]
    ConnectionAccepted { connection_id: String },

    /// A proposed connection was refused
    #[serde(rename_all = "camelCase")]
    ConnectionRejected { connection_id: String, error: String },

    /// A connection was deleted
    #[serde(rename_all = "camelCase")]
    ConnectionRemoved { connection_id: String },

    /// Nodes whose outputs became stale
    #[serde(rename_all = "camelCase")]
    NodesMarkedDirty { node_ids: Vec<String> },

    /// A node's lifecycle status changed
    #[serde(rename_all = "camelCase")]
    NodeStatusChanged { node_id: String, status: NodeStatus },

    /// An edge's run status changed
    #[serde(rename_all = "camelCase")]
    EdgeStatusChanged { edge_id: String, status: EdgeStatus },
}

/// A no-op event sink that discards all events
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: GraphEvent) -> Result<(), EventError> {
        Ok(())
    }
}

/// A vector-based event sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecEventSink {
    events: std::sync::Mutex<Vec<GraphEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<GraphEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Default for VecEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: GraphEvent) -> Result<(), EventError> {
        self.events
            .lock()
            .map_err(|_| EventError {
                message: "Event buffer poisoned".to_string(),
            })?
            .push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_event_sink() {
        let sink = VecEventSink::new();

        sink.send(GraphEvent::NodesMarkedDirty {
            node_ids: vec!["a".to_string(), "b".to_string()],
        })
        .unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);

        match &events[0] {
            GraphEvent::NodesMarkedDirty { node_ids } => {
                assert_eq!(node_ids, &vec!["a", "b"]);
            }
            _ => panic!("Expected NodesMarkedDirty event"),
        }

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_null_event_sink() {
        let sink = NullEventSink;
        sink.send(GraphEvent::ConnectionRemoved {
            connection_id: "c1".to_string(),
        })
        .unwrap();
    }

    #[test]
    fn test_event_serialization() {
        let event = GraphEvent::NodeStatusChanged {
            node_id: "img".to_string(),
            status: NodeStatus::Queued,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "nodeStatusChanged", "nodeId": "img", "status": "queued"})
        );
    }
}
