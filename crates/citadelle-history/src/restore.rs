//! Restoring a document to a historical version.
//!
//! A restore always snapshots the live content first, as an automatic
//! version, so the state being overwritten can itself be restored later.

use crate::content::ContentNode;
use crate::error::HistoryResult;
use crate::store::{CreateOutcome, VersionStore};
use crate::version::{AutoReason, Version, VersionId, VersionKind};
use chrono::{DateTime, Utc};
use citadelle_util::Identifier;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Access to the host editor's live documents.
pub trait LiveDocuments {
    /// A private copy of the document's current content, if it is open.
    fn live_content(&self, document_id: &str) -> Option<ContentNode>;

    /// Overwrite the document's content and mark it as having unsaved changes.
    fn replace_content(&mut self, document_id: &str, content: ContentNode);
}

/// A document open in the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: ContentNode,
    #[serde(default)]
    pub is_dirty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<DateTime<Utc>>,
}

impl Document {
    pub fn new(title: impl Into<String>, content: ContentNode) -> Self {
        Self {
            id: Identifier::document(),
            title: title.into(),
            content,
            is_dirty: false,
            last_saved: None,
        }
    }

    pub fn mark_saved(&mut self) {
        self.is_dirty = false;
        self.last_saved = Some(Utc::now());
    }
}

/// In-memory set of open documents.
#[derive(Debug, Clone, Default)]
pub struct OpenDocuments {
    documents: BTreeMap<String, Document>,
}

impl OpenDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a document, replacing any open document with the same id.
    pub fn open(&mut self, document: Document) {
        self.documents.insert(document.id.clone(), document);
    }

    pub fn close(&mut self, document_id: &str) -> Option<Document> {
        self.documents.remove(document_id)
    }

    pub fn get(&self, document_id: &str) -> Option<&Document> {
        self.documents.get(document_id)
    }

    pub fn get_mut(&mut self, document_id: &str) -> Option<&mut Document> {
        self.documents.get_mut(document_id)
    }
}

impl LiveDocuments for OpenDocuments {
    fn live_content(&self, document_id: &str) -> Option<ContentNode> {
        self.documents.get(document_id).map(|d| d.content.clone())
    }

    fn replace_content(&mut self, document_id: &str, content: ContentNode) {
        if let Some(document) = self.documents.get_mut(document_id) {
            document.content = content;
            document.is_dirty = true;
        }
    }
}

/// Label of the safety snapshot taken before restoring `label`.
pub fn pre_restore_label(label: &str) -> String {
    format!("Before restoring {label}")
}

/// Result of a completed restore.
#[derive(Debug, Clone, PartialEq)]
pub struct RestoreOutcome {
    pub document_id: String,
    /// Version whose content is now live.
    pub restored: VersionId,
    /// Automatic version holding the content from just before the restore.
    pub safety: Version,
    /// Version evicted to make room for the safety snapshot, if any.
    pub evicted: Option<Version>,
}

/// A restore whose safety snapshot is recorded but whose content is not yet live.
#[derive(Debug)]
#[must_use = "the live document is unchanged until the restore is applied"]
pub struct PendingRestore {
    document_id: String,
    restored: VersionId,
    content: ContentNode,
    safety: CreateOutcome,
}

impl PendingRestore {
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Take the safety snapshot back out of the store, reinstating any
    /// version it evicted. The live document was never touched.
    pub(crate) fn revert(self, store: &mut VersionStore) {
        debug!(
            document_id = %self.document_id,
            restored = %self.restored,
            "Abandoning restore"
        );
        store.revert_create(self.safety);
    }

    /// Overwrite the live document with the historical content.
    pub fn apply<H: LiveDocuments + ?Sized>(self, host: &mut H) -> RestoreOutcome {
        host.replace_content(&self.document_id, self.content);
        info!(
            document_id = %self.document_id,
            restored = %self.restored,
            safety = %self.safety.version.id,
            "Restored version"
        );
        RestoreOutcome {
            document_id: self.document_id,
            restored: self.restored,
            safety: self.safety.version,
            evicted: self.safety.evicted,
        }
    }
}

/// Record the safety snapshot for restoring `version_id`.
///
/// Returns `None`, changing nothing, when the version is unknown or its
/// document is not open. The target's content is copied before the safety
/// snapshot is inserted, so the restore still succeeds if that insertion
/// evicts the target.
pub fn begin_restore<H: LiveDocuments + ?Sized>(
    store: &mut VersionStore,
    host: &H,
    version_id: &VersionId,
) -> HistoryResult<Option<PendingRestore>> {
    let Some(target) = store.get(version_id) else {
        debug!(version_id = %version_id, "Restore target not found");
        return Ok(None);
    };
    let Some(live) = host.live_content(&target.document_id) else {
        debug!(
            version_id = %version_id,
            document_id = %target.document_id,
            "Document for restore is not open"
        );
        return Ok(None);
    };

    let document_id = target.document_id.clone();
    let label = pre_restore_label(&target.label);
    let content = target.content.clone();

    let safety = store.create_version(
        &document_id,
        label,
        live,
        VersionKind::Auto(AutoReason::PreRestore),
    )?;

    Ok(Some(PendingRestore {
        document_id,
        restored: version_id.clone(),
        content,
        safety,
    }))
}

/// Restore a version in one step: safety snapshot, then overwrite.
pub fn restore_version<H: LiveDocuments + ?Sized>(
    store: &mut VersionStore,
    host: &mut H,
    version_id: &VersionId,
) -> HistoryResult<Option<RestoreOutcome>> {
    Ok(begin_restore(store, host, version_id)?.map(|pending| pending.apply(host)))
}
