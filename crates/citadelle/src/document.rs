//! Document files on disk.
//!
//! A document file is the JSON form of an open editor document:
//! `{ "id", "title", "content" }`, optionally with `isDirty` and `lastSaved`.

use anyhow::Context as _;
use citadelle_history::Document;
use std::path::Path;
use tracing::debug;

pub async fn load(path: &Path) -> anyhow::Result<Document> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read document {}", path.display()))?;
    let document: Document = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid document file {}", path.display()))?;
    debug!(path = %path.display(), document_id = %document.id, "Loaded document");
    Ok(document)
}

/// Write the document back, replacing the file atomically.
pub async fn save(path: &Path, document: &Document) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(document)?;
    let temp = path.with_extension("json.tmp");
    tokio::fs::write(&temp, json)
        .await
        .with_context(|| format!("Failed to write {}", temp.display()))?;
    tokio::fs::rename(&temp, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    debug!(path = %path.display(), document_id = %document.id, "Saved document");
    Ok(())
}

/// A document id given directly, or read from a document file.
pub async fn resolve_id(arg: &str) -> anyhow::Result<String> {
    let path = Path::new(arg);
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        Ok(load(path).await?.id)
    } else {
        Ok(arg.to_string())
    }
}
