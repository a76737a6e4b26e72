//! Configuration for document serialization

use serde::{Deserialize, Serialize};

use crate::types::ViewState;

/// Default values stamped into new documents
pub mod defaults {
    /// Schema version written by this crate
    pub const SCHEMA_VERSION: &str = "1.0.0";
    /// Version of the built-in port templates
    pub const NODE_VERSION: &str = "1.0.0";
    pub const TITLE: &str = "Untitled Workflow";
    pub const AUTHOR: &str = "anonymous";
}

/// Values the serializer uses when building a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SerializerConfig {
    /// Schema version written to `schemaVersion`
    pub schema_version: String,
    /// Template version written to each node
    pub node_version: String,
    /// Title used when the caller supplies none
    pub default_title: String,
    /// Author used when the caller supplies none
    pub default_author: String,
    /// Initial viewport
    pub view_state: ViewState,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            schema_version: defaults::SCHEMA_VERSION.to_string(),
            node_version: defaults::NODE_VERSION.to_string(),
            default_title: defaults::TITLE.to_string(),
            default_author: defaults::AUTHOR.to_string(),
            view_state: ViewState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let config: SerializerConfig =
            serde_json::from_str(r#"{"defaultTitle": "Storyboard"}"#).unwrap();
        assert_eq!(config.default_title, "Storyboard");
        assert_eq!(config.schema_version, defaults::SCHEMA_VERSION);
        assert_eq!(config.view_state.zoom, 1.0);
    }
}
