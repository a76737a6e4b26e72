//! Reading and writing documents as JSON files

use std::path::Path;

use crate::error::Result;
use crate::types::ComputeGraphDocument;

/// Read a document from a JSON file
pub fn read_document(path: impl AsRef<Path>) -> Result<ComputeGraphDocument> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let document: ComputeGraphDocument = serde_json::from_str(&content)?;
    log::info!(
        "Loaded workflow '{}' ({} nodes, {} edges) from {:?}",
        document.metadata.title,
        document.nodes.len(),
        document.edges.len(),
        path
    );
    Ok(document)
}

/// Write a document as pretty-printed JSON, creating parent directories
pub fn write_document(path: impl AsRef<Path>, document: &ComputeGraphDocument) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(document)?;
    std::fs::write(path, content)?;
    log::debug!("Saved workflow '{}' to {:?}", document.metadata.title, path);
    Ok(())
}

/// Load every `*.json` document in a directory
///
/// Files that fail to parse are skipped with a warning. A missing
/// directory yields an empty list.
pub fn load_documents(dir: impl AsRef<Path>) -> Result<Vec<ComputeGraphDocument>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut documents = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let file_path = entry?.path();
        if file_path.extension().map_or(false, |e| e == "json") {
            match read_document(&file_path) {
                Ok(document) => documents.push(document),
                Err(e) => log::warn!("Failed to load workflow from {:?}: {}", file_path, e),
            }
        }
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::DocumentBuilder;
    use crate::error::ComputeFlowError;
    use crate::types::NodeKind;
    use tempfile::TempDir;

    fn sample() -> ComputeGraphDocument {
        DocumentBuilder::new("Saved")
            .add_node("img", NodeKind::Image, (0.0, 0.0))
            .add_node("out", NodeKind::Output, (200.0, 0.0))
            .add_edge("img", "img-output-0", "out", "out-input-0")
            .build()
    }

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("flow.json");

        let doc = sample();
        write_document(&path, &doc).unwrap();
        let loaded = read_document(&path).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = read_document(temp_dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ComputeFlowError::Io(_)));
    }

    #[test]
    fn test_read_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            read_document(&path),
            Err(ComputeFlowError::Serialization(_))
        ));
    }

    #[test]
    fn test_load_documents_skips_bad_files() {
        let temp_dir = TempDir::new().unwrap();
        write_document(temp_dir.path().join("a.json"), &sample()).unwrap();
        std::fs::write(temp_dir.path().join("b.json"), "[]").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

        let docs = load_documents(temp_dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(load_documents(temp_dir.path().join("missing")).unwrap().is_empty());
    }
}
