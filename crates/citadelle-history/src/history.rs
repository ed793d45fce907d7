//! Durable version history.
//!
//! [`VersionHistory`] wraps a [`VersionStore`] and writes the whole
//! collection through to a [`Storage`] backend after every mutation.

use crate::config::HistoryConfig;
use crate::content::ContentNode;
use crate::diff::{diff_contents_in_background, diff_contents_with, ContentDiff, DiffOptions};
use crate::error::{HistoryError, HistoryResult};
use crate::restore::{begin_restore, LiveDocuments, RestoreOutcome};
use crate::store::{CreateOutcome, VersionStore};
use crate::version::{AutoReason, Version, VersionId, VersionKind};
use chrono::{DateTime, Duration, Utc};
use citadelle_storage::Storage;
use citadelle_util::TimingGuard;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Format tag written with the persisted collection.
pub const HISTORY_FORMAT: u32 = 1;

/// Label of periodic backups.
pub const CHECKPOINT_LABEL: &str = "Automatic backup";

#[derive(Deserialize)]
struct PersistedHistory {
    format: u32,
    versions: Vec<Version>,
}

#[derive(Serialize)]
struct PersistedHistoryRef<'a> {
    format: u32,
    versions: Vec<&'a Version>,
}

/// Version history persisted through a storage backend.
pub struct VersionHistory<S: Storage> {
    storage: S,
    store: VersionStore,
    key: String,
    diff_options: DiffOptions,
    auto_retention: Duration,
}

impl<S: Storage> VersionHistory<S> {
    /// Load the history kept under the configured key.
    ///
    /// A missing key is an empty history. A bare array of versions is
    /// accepted as the unversioned layout.
    pub async fn open(storage: S, config: &HistoryConfig) -> HistoryResult<Self> {
        let key = config.storage_key.clone();
        let raw: Option<Value> = storage.read(&[key.as_str()]).await?;

        let versions = match raw {
            None => Vec::new(),
            Some(value) => decode(value)?,
        };

        let store = VersionStore::with_versions(config.capacity, config.overflow, versions)?;
        info!(
            key = %key,
            versions = store.len(),
            documents = store.documents().count(),
            "Opened version history"
        );

        Ok(Self {
            storage,
            store,
            key,
            diff_options: config.diff_options(),
            auto_retention: Duration::days(i64::from(config.auto_retention_days)),
        })
    }

    /// Read-only access to the in-memory store.
    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Create a version and persist the collection.
    ///
    /// If persisting fails the version stays in memory and the error is
    /// returned; the next successful flush writes it out.
    pub async fn create_version(
        &mut self,
        document_id: &str,
        label: impl Into<String>,
        content: ContentNode,
        kind: VersionKind,
    ) -> HistoryResult<CreateOutcome> {
        let outcome = self.store.create_version(document_id, label, content, kind)?;
        self.flush().await?;
        Ok(outcome)
    }

    /// Delete a version. Unknown ids are a no-op and write nothing.
    pub async fn delete_version(&mut self, id: &VersionId) -> HistoryResult<Option<Version>> {
        let removed = self.store.delete_version(id);
        if removed.is_some() {
            self.flush().await?;
        }
        Ok(removed)
    }

    pub fn versions_for_document(&self, document_id: &str) -> Vec<&Version> {
        self.store.versions_for_document(document_id)
    }

    pub fn get(&self, id: &VersionId) -> Option<&Version> {
        self.store.get(id)
    }

    /// Diff two stored versions, `old` first. `None` if either is unknown.
    pub fn diff_versions(&self, old: &VersionId, new: &VersionId) -> Option<ContentDiff> {
        let old = self.store.get(old)?;
        let new = self.store.get(new)?;
        Some(diff_contents_with(
            &old.content,
            &new.content,
            &self.diff_options,
        ))
    }

    /// Diff a stored version against live content, off the calling task.
    pub async fn diff_against(
        &self,
        id: &VersionId,
        live: &ContentNode,
    ) -> HistoryResult<Option<ContentDiff>> {
        let Some(version) = self.store.get(id) else {
            return Ok(None);
        };
        let diff =
            diff_contents_in_background(version.content.clone(), live.clone(), self.diff_options)
                .await?;
        Ok(Some(diff))
    }

    /// Restore a version into the host document.
    ///
    /// The safety snapshot is persisted before the live content is touched.
    /// If that write fails, the snapshot is taken back out of memory along
    /// with any eviction it caused, and the document is left as it was.
    pub async fn restore<H: LiveDocuments + ?Sized>(
        &mut self,
        host: &mut H,
        id: &VersionId,
    ) -> HistoryResult<Option<RestoreOutcome>> {
        let Some(pending) = begin_restore(&mut self.store, host, id)? else {
            return Ok(None);
        };
        if let Err(e) = self.flush().await {
            pending.revert(&mut self.store);
            return Err(e);
        }
        Ok(Some(pending.apply(host)))
    }

    /// Take a periodic backup, unless the content matches the latest version.
    pub async fn checkpoint(
        &mut self,
        document_id: &str,
        content: ContentNode,
    ) -> HistoryResult<Option<CreateOutcome>> {
        let unchanged = self
            .store
            .latest_for_document(document_id)
            .is_some_and(|latest| latest.content == content);
        if unchanged {
            debug!(document_id = %document_id, "Skipping checkpoint, content unchanged");
            return Ok(None);
        }

        let outcome = self
            .create_version(
                document_id,
                CHECKPOINT_LABEL,
                content,
                VersionKind::Auto(AutoReason::Periodic),
            )
            .await?;
        Ok(Some(outcome))
    }

    /// Drop automatic versions older than the retention window.
    ///
    /// A window reaching back past the earliest representable time prunes nothing.
    pub async fn prune_expired(&mut self, now: DateTime<Utc>) -> HistoryResult<Vec<Version>> {
        let Some(cutoff) = now.checked_sub_signed(self.auto_retention) else {
            debug!(key = %self.key, "Retention window predates any version, nothing to prune");
            return Ok(Vec::new());
        };
        let pruned = self.store.prune_auto_older_than(cutoff);
        if !pruned.is_empty() {
            self.flush().await?;
        }
        Ok(pruned)
    }

    /// Write the whole collection to storage.
    pub async fn flush(&self) -> HistoryResult<()> {
        let _timing = TimingGuard::persist(&self.key);
        let envelope = PersistedHistoryRef {
            format: HISTORY_FORMAT,
            versions: self.store.iter().collect(),
        };
        if let Err(e) = self.storage.write(&[self.key.as_str()], &envelope).await {
            warn!(key = %self.key, error = %e, "Failed to persist version history");
            return Err(e.into());
        }
        debug!(key = %self.key, versions = envelope.versions.len(), "Persisted version history");
        Ok(())
    }
}

fn decode(value: Value) -> HistoryResult<Vec<Version>> {
    if value.is_array() {
        return serde_json::from_value(value).map_err(|e| HistoryError::corrupted(e.to_string()));
    }

    let found = value
        .get("format")
        .and_then(Value::as_u64)
        .ok_or_else(|| HistoryError::corrupted("missing format tag"))?;
    if found != u64::from(HISTORY_FORMAT) {
        return Err(HistoryError::UnsupportedFormat {
            found: u32::try_from(found).unwrap_or(u32::MAX),
            expected: HISTORY_FORMAT,
        });
    }

    let persisted: PersistedHistory =
        serde_json::from_value(value).map_err(|e| HistoryError::corrupted(e.to_string()))?;
    Ok(persisted.versions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverflowPolicy;
    use crate::diff::DiffTag;
    use crate::restore::{Document, OpenDocuments};
    use citadelle_storage::{JsonStorage, MemoryStorage};
    use tempfile::TempDir;

    const KEY: &[&str] = &["citadelle-versions"];

    async fn memory_history() -> VersionHistory<MemoryStorage> {
        VersionHistory::open(MemoryStorage::new(), &HistoryConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_key_is_empty_history() {
        let history = memory_history().await;
        assert!(history.store().is_empty());
        assert!(history.storage().raw(KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_writes_through() {
        let mut history = memory_history().await;
        history
            .create_version("doc", "v1", ContentNode::from_lines(["a"]), VersionKind::Manual)
            .await
            .unwrap();

        let raw = history.storage().raw(KEY).unwrap().unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["format"], 1);
        assert_eq!(value["versions"][0]["label"], "v1");
        assert_eq!(value["versions"][0]["isAuto"], false);
    }

    #[tokio::test]
    async fn test_reopen_preserves_everything() {
        let dir = TempDir::new().unwrap();
        let config = HistoryConfig::default();

        let mut history = VersionHistory::open(JsonStorage::new(dir.path()), &config)
            .await
            .unwrap();
        let v1 = history
            .create_version("doc", "v1", ContentNode::from_lines(["un"]), VersionKind::Manual)
            .await
            .unwrap()
            .version;
        history
            .checkpoint("doc", ContentNode::from_lines(["un", "deux"]))
            .await
            .unwrap();

        let reopened = VersionHistory::open(JsonStorage::new(dir.path()), &config)
            .await
            .unwrap();
        assert_eq!(reopened.get(&v1.id), Some(&v1));
        assert_eq!(reopened.versions_for_document("doc").len(), 2);
        assert_eq!(
            reopened.store().latest_for_document("doc").unwrap().label,
            CHECKPOINT_LABEL
        );
    }

    #[tokio::test]
    async fn test_unknown_format_rejected() {
        let storage = MemoryStorage::new();
        storage
            .insert_raw(KEY, r#"{"format": 7, "versions": []}"#)
            .unwrap();
        let err = VersionHistory::open(storage, &HistoryConfig::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            HistoryError::UnsupportedFormat {
                found: 7,
                expected: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_bare_array_accepted() {
        let storage = MemoryStorage::new();
        storage
            .insert_raw(
                KEY,
                r#"[{"id":"ver-1","documentId":"doc-1","label":"v1",
                    "content":{"type":"doc","content":[]},"timestamp":1700000000000,"isAuto":false}]"#,
            )
            .unwrap();
        let history = VersionHistory::open(storage, &HistoryConfig::default())
            .await
            .unwrap();
        assert_eq!(history.versions_for_document("doc-1").len(), 1);
    }

    #[tokio::test]
    async fn test_garbage_is_corrupted() {
        let storage = MemoryStorage::new();
        storage.insert_raw(KEY, r#"{"versions": []}"#).unwrap();
        let err = VersionHistory::open(storage, &HistoryConfig::default())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, HistoryError::Corrupted(_)));
    }

    #[tokio::test]
    async fn test_delete_unknown_writes_nothing() {
        let mut history = memory_history().await;
        assert!(history
            .delete_version(&VersionId::new())
            .await
            .unwrap()
            .is_none());
        assert!(history.storage().raw(KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_checkpoint_skips_unchanged_content() {
        let mut history = memory_history().await;
        let content = ContentNode::from_lines(["inchangé"]);

        let first = history.checkpoint("doc", content.clone()).await.unwrap();
        assert_eq!(
            first.unwrap().version.kind,
            VersionKind::Auto(AutoReason::Periodic)
        );
        assert!(history.checkpoint("doc", content).await.unwrap().is_none());
        assert_eq!(history.store().document_count("doc"), 1);
    }

    #[tokio::test]
    async fn test_restore_persists_safety_snapshot() {
        let mut history = memory_history().await;
        let document = Document::new("Bail", ContentNode::from_lines(["courant"]));
        let id = document.id.clone();
        let mut docs = OpenDocuments::new();
        docs.open(document);

        let v1 = history
            .create_version(&id, "v1", ContentNode::from_lines(["ancien"]), VersionKind::Manual)
            .await
            .unwrap()
            .version;

        let outcome = history.restore(&mut docs, &v1.id).await.unwrap().unwrap();
        assert_eq!(docs.get(&id).unwrap().content, v1.content);

        let raw = history.storage().raw(KEY).unwrap().unwrap();
        assert!(raw.contains(outcome.safety.id.as_str()));
        assert!(raw.contains("Before restoring v1"));
    }

    #[tokio::test]
    async fn test_diff_versions_and_live() {
        let mut history = memory_history().await;
        let a = history
            .create_version("doc", "a", ContentNode::from_lines(["x", "y"]), VersionKind::Manual)
            .await
            .unwrap()
            .version;
        let b = history
            .create_version("doc", "b", ContentNode::from_lines(["x", "z"]), VersionKind::Manual)
            .await
            .unwrap()
            .version;

        let diff = history.diff_versions(&a.id, &b.id).unwrap();
        assert_eq!(diff.summary(), "-1 +1 lines");
        assert!(history.diff_versions(&a.id, &VersionId::new()).is_none());

        let live = ContentNode::from_lines(["x", "y"]);
        let diff = history.diff_against(&a.id, &live).await.unwrap().unwrap();
        assert!(diff.lines.iter().all(|l| l.tag == DiffTag::Same));
    }

    #[tokio::test]
    async fn test_prune_expired_keeps_recent() {
        let config = HistoryConfig {
            auto_retention_days: 1,
            overflow: OverflowPolicy::AllowGrowth,
            ..Default::default()
        };
        let mut history = VersionHistory::open(MemoryStorage::new(), &config)
            .await
            .unwrap();
        history
            .checkpoint("doc", ContentNode::from_lines(["a"]))
            .await
            .unwrap();

        let pruned = history.prune_expired(Utc::now()).await.unwrap();
        assert!(pruned.is_empty());

        let pruned = history
            .prune_expired(Utc::now() + Duration::days(2))
            .await
            .unwrap();
        assert_eq!(pruned.len(), 1);
        assert!(history.store().is_empty());
    }

    #[tokio::test]
    async fn test_prune_with_unrepresentable_window_prunes_nothing() {
        let config = HistoryConfig {
            auto_retention_days: 100_000_000,
            ..Default::default()
        };
        let mut history = VersionHistory::open(MemoryStorage::new(), &config)
            .await
            .unwrap();
        history
            .checkpoint("doc", ContentNode::from_lines(["a"]))
            .await
            .unwrap();

        let pruned = history.prune_expired(Utc::now()).await.unwrap();
        assert!(pruned.is_empty());
        assert_eq!(history.store().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_restore_write_rolls_back_store() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("history");
        let config = HistoryConfig {
            capacity: 2,
            ..Default::default()
        };
        let mut history = VersionHistory::open(JsonStorage::new(&root), &config)
            .await
            .unwrap();

        let document = Document::new("Bail", ContentNode::from_lines(["courant"]));
        let id = document.id.clone();
        let mut docs = OpenDocuments::new();
        docs.open(document);

        let target = history
            .create_version(
                &id,
                "backup",
                ContentNode::from_lines(["ancien"]),
                VersionKind::Auto(AutoReason::Periodic),
            )
            .await
            .unwrap()
            .version;
        history
            .create_version(&id, "v1", ContentNode::from_lines(["v1"]), VersionKind::Manual)
            .await
            .unwrap();
        let before: Vec<VersionId> = history.store().iter().map(|v| v.id.clone()).collect();

        // A plain file where the storage directory should be makes every write fail.
        std::fs::remove_dir_all(&root).unwrap();
        std::fs::write(&root, "").unwrap();

        let result = history.restore(&mut docs, &target.id).await;
        assert!(matches!(result, Err(HistoryError::Storage(_))));

        let after: Vec<VersionId> = history.store().iter().map(|v| v.id.clone()).collect();
        assert_eq!(after, before);
        assert!(history.get(&target.id).is_some());

        let doc = docs.get(&id).unwrap();
        assert_eq!(doc.content, ContentNode::from_lines(["courant"]));
        assert!(!doc.is_dirty);
    }
}
