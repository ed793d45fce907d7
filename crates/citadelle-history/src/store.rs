//! In-memory version store.
//!
//! Versions are partitioned by document. Each document's list is kept in
//! insertion order; queries sort by timestamp.

use crate::config::{HistoryConfig, OverflowPolicy};
use crate::content::ContentNode;
use crate::error::{HistoryError, HistoryResult};
use crate::version::{Version, VersionId, VersionKind};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// What happened when a version was added.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateOutcome {
    /// The stored version.
    pub version: Version,
    /// Version removed to make room, if any.
    pub evicted: Option<Version>,
    /// The document now holds more versions than the configured capacity.
    pub over_capacity: bool,
    /// Where `evicted` sat in its document's list.
    pub(crate) evicted_at: Option<usize>,
}

/// Owns every version of every document.
#[derive(Debug, Clone)]
pub struct VersionStore {
    documents: BTreeMap<String, Vec<Version>>,
    /// Version id -> owning document id.
    index: HashMap<VersionId, String>,
    capacity: usize,
    overflow: OverflowPolicy,
}

impl Default for VersionStore {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CAPACITY, OverflowPolicy::default())
    }
}

impl VersionStore {
    /// Create an empty store. A capacity of zero is treated as one.
    pub fn new(capacity: usize, overflow: OverflowPolicy) -> Self {
        Self {
            documents: BTreeMap::new(),
            index: HashMap::new(),
            capacity: capacity.max(1),
            overflow,
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(config.capacity, config.overflow)
    }

    /// Rebuild a store from a persisted list, in list order.
    ///
    /// No eviction is applied: a history loaded over capacity stays that way
    /// until the next insertion for that document.
    pub fn with_versions(
        capacity: usize,
        overflow: OverflowPolicy,
        versions: impl IntoIterator<Item = Version>,
    ) -> HistoryResult<Self> {
        let mut store = Self::new(capacity, overflow);
        for version in versions {
            if store.index.contains_key(&version.id) {
                return Err(HistoryError::corrupted(format!(
                    "duplicate version id {}",
                    version.id
                )));
            }
            store
                .index
                .insert(version.id.clone(), version.document_id.clone());
            store
                .documents
                .entry(version.document_id.clone())
                .or_default()
                .push(version);
        }
        Ok(store)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn overflow(&self) -> OverflowPolicy {
        self.overflow
    }

    /// Create a version with a fresh id and the current time.
    ///
    /// `content` must already be a private copy of the live document's tree.
    pub fn create_version(
        &mut self,
        document_id: &str,
        label: impl Into<String>,
        content: ContentNode,
        kind: VersionKind,
    ) -> HistoryResult<CreateOutcome> {
        self.insert(Version::new(document_id, label, content, kind))
    }

    /// Add a prebuilt version, enforcing the capacity policy.
    ///
    /// At capacity the oldest automatic version of the document is evicted.
    /// Without one, the overflow policy decides.
    pub fn insert(&mut self, version: Version) -> HistoryResult<CreateOutcome> {
        if version.label.trim().is_empty() {
            return Err(HistoryError::InvalidLabel(version.label));
        }

        let document_id = version.document_id.clone();
        let current = self.document_count(&document_id);

        let mut evicted = None;
        let mut evicted_at = None;
        if current >= self.capacity {
            let overflow = self.overflow;
            let victim = self.documents.get_mut(&document_id).and_then(|list| {
                pick_victim(list, overflow).map(|position| (position, list.remove(position)))
            });
            match victim {
                Some((position, removed)) => {
                    self.index.remove(&removed.id);
                    debug!(
                        document_id = %document_id,
                        version_id = %removed.id,
                        "Evicted version to make room"
                    );
                    evicted = Some(removed);
                    evicted_at = Some(position);
                }
                None if overflow == OverflowPolicy::Reject => {
                    return Err(HistoryError::CapacityExhausted {
                        document_id,
                        capacity: self.capacity,
                    });
                }
                None => {}
            }
        }

        self.index.insert(version.id.clone(), document_id.clone());
        let list = self.documents.entry(document_id.clone()).or_default();
        list.push(version.clone());
        let count = list.len();

        let over_capacity = count > self.capacity;
        if over_capacity {
            warn!(
                document_id = %document_id,
                count,
                capacity = self.capacity,
                "Version history over capacity, no automatic version to evict"
            );
        }

        info!(
            document_id = %document_id,
            version_id = %version.id,
            label = %version.label,
            auto = version.is_auto(),
            "Created version"
        );

        Ok(CreateOutcome {
            version,
            evicted,
            over_capacity,
            evicted_at,
        })
    }

    /// Undo an insertion: drop the new version and put back what it evicted,
    /// at its former place in the list.
    pub(crate) fn revert_create(&mut self, outcome: CreateOutcome) {
        let CreateOutcome {
            version,
            evicted,
            evicted_at,
            ..
        } = outcome;

        if self.index.remove(&version.id).is_some() {
            if let Some(list) = self.documents.get_mut(&version.document_id) {
                list.retain(|v| v.id != version.id);
            }
        }

        if let Some(evicted) = evicted {
            self.index
                .insert(evicted.id.clone(), evicted.document_id.clone());
            let list = self
                .documents
                .entry(evicted.document_id.clone())
                .or_default();
            let position = evicted_at.unwrap_or(list.len()).min(list.len());
            list.insert(position, evicted);
        }
        self.documents.retain(|_, list| !list.is_empty());

        debug!(
            document_id = %version.document_id,
            version_id = %version.id,
            "Reverted version"
        );
    }

    /// Remove a version. Unknown ids are a no-op.
    pub fn delete_version(&mut self, id: &VersionId) -> Option<Version> {
        let document_id = self.index.remove(id)?;
        let list = self.documents.get_mut(&document_id)?;
        let position = list.iter().position(|v| &v.id == id)?;
        let removed = list.remove(position);
        if list.is_empty() {
            self.documents.remove(&document_id);
        }
        info!(document_id = %document_id, version_id = %id, "Deleted version");
        Some(removed)
    }

    /// All versions of a document, newest first.
    ///
    /// The sort is stable: versions sharing a timestamp keep insertion order.
    pub fn versions_for_document(&self, document_id: &str) -> Vec<&Version> {
        let Some(list) = self.documents.get(document_id) else {
            return Vec::new();
        };
        let mut versions: Vec<&Version> = list.iter().collect();
        versions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        versions
    }

    /// Most recent version of a document: the latest timestamp, and among
    /// equal timestamps the last one inserted.
    pub fn latest_for_document(&self, document_id: &str) -> Option<&Version> {
        self.documents
            .get(document_id)?
            .iter()
            .max_by_key(|v| v.timestamp)
    }

    pub fn get(&self, id: &VersionId) -> Option<&Version> {
        let document_id = self.index.get(id)?;
        self.documents
            .get(document_id)?
            .iter()
            .find(|v| &v.id == id)
    }

    pub fn document_count(&self, document_id: &str) -> usize {
        self.documents.get(document_id).map_or(0, Vec::len)
    }

    /// Ids of documents that have at least one version.
    pub fn documents(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    /// Every version, grouped by document, each group in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Version> {
        self.documents.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Drop automatic versions created before `cutoff`. Manual versions are kept.
    pub fn prune_auto_older_than(&mut self, cutoff: DateTime<Utc>) -> Vec<Version> {
        let mut pruned = Vec::new();
        for list in self.documents.values_mut() {
            let (expired, kept): (Vec<Version>, Vec<Version>) = std::mem::take(list)
                .into_iter()
                .partition(|v| v.is_auto() && v.timestamp < cutoff);
            *list = kept;
            pruned.extend(expired);
        }
        self.documents.retain(|_, list| !list.is_empty());
        for version in &pruned {
            self.index.remove(&version.id);
        }
        if !pruned.is_empty() {
            info!(count = pruned.len(), cutoff = %cutoff, "Pruned expired automatic versions");
        }
        pruned
    }
}

/// Position of the version to evict from a full list, if any.
fn pick_victim(list: &[Version], overflow: OverflowPolicy) -> Option<usize> {
    let oldest_auto = list
        .iter()
        .enumerate()
        .filter(|(_, v)| matches!(v.kind, VersionKind::Auto(_)))
        .min_by_key(|(_, v)| v.timestamp)
        .map(|(i, _)| i);

    match (oldest_auto, overflow) {
        (Some(i), _) => Some(i),
        (None, OverflowPolicy::EvictOldest) => list
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| v.timestamp)
            .map(|(i, _)| i),
        (None, _) => None,
    }
}
