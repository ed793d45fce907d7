//! Version data structures.

use crate::content::ContentNode;
use chrono::{DateTime, Local, SubsecRound, TimeZone, Utc};
use citadelle_util::Identifier;
use serde::{Deserialize, Serialize, Serializer};

/// Unique identifier for a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    /// Create a new random version ID.
    pub fn new() -> Self {
        Self(Identifier::version())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VersionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for VersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why the system took an automatic version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AutoReason {
    /// Safety copy of the live content taken right before a restore.
    PreRestore,
    /// Periodic backup of a document that changed since its last version.
    Periodic,
}

/// Who created a version. Only automatic versions are evictable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionKind {
    Manual,
    Auto(AutoReason),
}

impl VersionKind {
    pub fn is_auto(&self) -> bool {
        matches!(self, VersionKind::Auto(_))
    }
}

/// An immutable snapshot of one document's content.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "VersionRecord")]
pub struct Version {
    pub id: VersionId,
    pub document_id: String,
    pub label: String,
    /// Exclusively owned deep copy of the content tree.
    pub content: ContentNode,
    pub timestamp: DateTime<Utc>,
    pub kind: VersionKind,
}

impl Version {
    /// Create a version stamped with the current time, to the millisecond
    /// precision it is persisted with.
    pub fn new(
        document_id: impl Into<String>,
        label: impl Into<String>,
        content: ContentNode,
        kind: VersionKind,
    ) -> Self {
        Self {
            id: VersionId::new(),
            document_id: document_id.into(),
            label: label.into(),
            content,
            timestamp: Utc::now().trunc_subsecs(3),
            kind,
        }
    }

    /// Override the creation time (imports and tests).
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn is_auto(&self) -> bool {
        self.kind.is_auto()
    }
}

/// Label used when the user takes a snapshot without naming it.
pub fn default_snapshot_label<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("Snapshot {}", now.format("%Y-%m-%d %H:%M:%S"))
}

/// Default label for a snapshot taken now, in local time.
pub fn default_snapshot_label_now() -> String {
    default_snapshot_label(&Local::now())
}

/// Persisted layout: a flat record with an `isAuto` flag.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionRecord {
    id: VersionId,
    document_id: String,
    label: String,
    content: ContentNode,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
    is_auto: bool,
    #[serde(default)]
    auto_reason: Option<AutoReason>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionRecordRef<'a> {
    id: &'a VersionId,
    document_id: &'a str,
    label: &'a str,
    content: &'a ContentNode,
    timestamp: i64,
    is_auto: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    auto_reason: Option<AutoReason>,
}

impl From<VersionRecord> for Version {
    fn from(record: VersionRecord) -> Self {
        let kind = if record.is_auto {
            VersionKind::Auto(record.auto_reason.unwrap_or(AutoReason::PreRestore))
        } else {
            VersionKind::Manual
        };
        Self {
            id: record.id,
            document_id: record.document_id,
            label: record.label,
            content: record.content,
            timestamp: record.timestamp,
            kind,
        }
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let auto_reason = match self.kind {
            VersionKind::Auto(reason) => Some(reason),
            VersionKind::Manual => None,
        };
        VersionRecordRef {
            id: &self.id,
            document_id: &self.document_id,
            label: &self.label,
            content: &self.content,
            timestamp: self.timestamp.timestamp_millis(),
            is_auto: self.kind.is_auto(),
            auto_reason,
        }
        .serialize(serializer)
    }
}
