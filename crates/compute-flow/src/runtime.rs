//! Run events reported by an external executor
//!
//! The engine never runs nodes itself. An executor reports progress per
//! node as [`RunEvent`]s, and the caller folds them into the runtime slice
//! of the matching node.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ComputeFlowError, Result};
use crate::types::{ArtifactRef, ComputeGraphDocument, NodeRuntimeState, NodeStatus};

/// Severity of an executor log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunLogLevel {
    Info,
    Warn,
    Error,
}

/// A log line attached to a run event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub level: RunLogLevel,
}

/// Status report for one node within one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunEvent {
    pub run_id: String,
    pub node_id: String,
    pub status: NodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<RunLog>,
    /// Artifacts produced so far, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<ArtifactRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunEvent {
    pub fn new(run_id: impl Into<String>, node_id: impl Into<String>, status: NodeStatus) -> Self {
        Self {
            run_id: run_id.into(),
            node_id: node_id.into(),
            status,
            progress: None,
            logs: Vec::new(),
            artifacts: Vec::new(),
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_artifact(mut self, artifact: ArtifactRef) -> Self {
        self.artifacts.push(artifact);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

impl NodeRuntimeState {
    /// Fold a run event into this state
    ///
    /// Progress is clamped to 0-100. The newest artifact replaces the
    /// preview. A successful run clears the dirty flag and any error; any
    /// other event without an error clears a stale one unless it reports
    /// a failure.
    pub fn apply(&mut self, event: &RunEvent) {
        self.status = event.status;

        if let Some(progress) = event.progress {
            self.progress = Some(progress.clamp(0.0, 100.0));
        }

        if let Some(artifact) = event.artifacts.last() {
            self.preview = Some(artifact.clone());
        }

        if event.status == NodeStatus::Succeeded {
            self.is_dirty = false;
            self.error = None;
            self.progress = Some(100.0);
        } else if event.error.is_some() {
            self.error = event.error.clone();
        } else if event.status != NodeStatus::Failed {
            self.error = None;
        }
    }
}

impl ComputeGraphDocument {
    /// Apply a run event to the node it names
    pub fn apply_run_event(&mut self, event: &RunEvent) -> Result<()> {
        let node = self
            .find_node_mut(&event.node_id)
            .ok_or_else(|| ComputeFlowError::NodeNotFound(event.node_id.clone()))?;
        node.runtime.apply(event);

        log::debug!(
            "Run '{}': node '{}' is now {:?}",
            event.run_id,
            event.node_id,
            event.status
        );
        Ok(())
    }
}
