//! Loading transcripts, context sets and batch manifests, and saving results.
//!
//! Context files use the vector-store export layout:
//!
//! ```json
//! {"data": {"vector_data": [{"text": "...", "id": 1}, ...]}}
//! ```
//!
//! A bare JSON array of passages is accepted as well.

use crate::context::{ContextPassage, ContextSet};
use crate::error::{EvalError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// One transcript/context pair to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalPair {
    pub transcript: PathBuf,
    pub contexts: PathBuf,
}

/// A list of pairs evaluated together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub pairs: Vec<EvalPair>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| {
        EvalError::Serialization(format!("Failed to parse '{}': {}", path.display(), e))
    })
}

/// Load a raw transcript. Its shape is checked later by normalization.
pub fn load_transcript(path: &Path) -> Result<Value> {
    read_json(path)
}

/// Load the context passages for one evaluation.
pub fn load_context_set(path: &Path) -> Result<ContextSet> {
    let raw: Value = read_json(path)?;
    parse_context_set(&raw)
}

/// Extract passages from a decoded context file.
///
/// Missing `data` or `vector_data` keys give an empty set.
pub fn parse_context_set(raw: &Value) -> Result<ContextSet> {
    let list = match raw {
        Value::Array(_) => Some(raw),
        _ => raw.get("data").and_then(|d| d.get("vector_data")),
    };

    let list = match list {
        None | Some(Value::Null) => return Ok(ContextSet::default()),
        Some(list) => list,
    };

    let passages: Vec<ContextPassage> = serde_json::from_value(list.clone())
        .map_err(|e| EvalError::InvalidContext(e.to_string()))?;

    if let Some(i) = passages.iter().position(|p| p.text.trim().is_empty()) {
        return Err(EvalError::InvalidContext(format!(
            "passage {} has empty text",
            i
        )));
    }

    Ok(ContextSet::new(passages))
}

/// Load a batch manifest. Relative paths resolve against the manifest's directory.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let mut manifest: Manifest = read_json(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    for pair in &mut manifest.pairs {
        pair.transcript = resolve(base, &pair.transcript);
        pair.contexts = resolve(base, &pair.contexts);
    }

    Ok(manifest)
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Save results as pretty-printed JSON, creating parent directories.
pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| EvalError::io(parent, e))?;
        }
    }

    let data = serde_json::to_string_pretty(value)
        .map_err(|e| EvalError::Serialization(e.to_string()))?;

    fs::write(path, data).map_err(|e| EvalError::io(path, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, value: &Value) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn test_load_vector_store_export() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "vectors.json",
            &json!({"data": {"vector_data": [
                {"id": 1, "text": "Paris is the capital of France."},
                {"id": 2, "text": "Berlin is the capital of Germany."}
            ]}}),
        );

        let contexts = load_context_set(&path).unwrap();
        assert_eq!(contexts.len(), 2);
        assert_eq!(contexts.passages()[1].metadata["id"], json!(2));
    }

    #[test]
    fn test_bare_array_of_passages() {
        let contexts = parse_context_set(&json!([{"text": "only one"}])).unwrap();
        assert_eq!(contexts.texts().collect::<Vec<_>>(), vec!["only one"]);
    }

    #[test]
    fn test_missing_vector_data_is_empty() {
        assert!(parse_context_set(&json!({})).unwrap().is_empty());
        assert!(parse_context_set(&json!({"data": {}})).unwrap().is_empty());
    }

    #[test]
    fn test_empty_passage_text_rejected() {
        let result = parse_context_set(&json!([{"text": "fine"}, {"text": "  "}]));
        assert!(matches!(result, Err(EvalError::InvalidContext(_))));
    }

    #[test]
    fn test_passage_without_text_rejected() {
        let result = parse_context_set(&json!({"data": {"vector_data": [{"id": 3}]}}));
        assert!(matches!(result, Err(EvalError::InvalidContext(_))));
    }

    #[test]
    fn test_load_transcript() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "chat.json", &json!({"messages": []}));
        assert_eq!(load_transcript(&path).unwrap(), json!({"messages": []}));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_transcript(Path::new("/nonexistent/chat.json"));
        assert!(matches!(result, Err(EvalError::Io { .. })));
    }

    #[test]
    fn test_invalid_json_is_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_transcript(&path),
            Err(EvalError::Serialization(_))
        ));
    }

    #[test]
    fn test_manifest_paths_resolve_against_manifest_dir() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "pairs.json",
            &json!({"pairs": [
                {"transcript": "data/chat1.json", "contexts": "/abs/vector1.json"}
            ]}),
        );

        let manifest = load_manifest(&path).unwrap();
        assert_eq!(manifest.pairs[0].transcript, dir.path().join("data/chat1.json"));
        assert_eq!(manifest.pairs[0].contexts, PathBuf::from("/abs/vector1.json"));
    }

    #[test]
    fn test_save_json_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/nested/results.json");

        save_json(&json!({"ok": true}), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"ok\": true"));
    }
}
