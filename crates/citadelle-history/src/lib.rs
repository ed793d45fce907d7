//! Version history for citadelle documents.
//!
//! This crate provides:
//! - Named snapshots of a document's rich-text content tree
//! - A bounded per-document history with automatic-version eviction
//! - Line diffs between any two snapshots
//! - Restore with an automatic safety snapshot of the live content
//! - Write-through persistence to a local storage backend
//!
//! # Example
//!
//! ```no_run
//! use citadelle_history::{ContentNode, HistoryConfig, VersionHistory, VersionKind};
//! use citadelle_storage::JsonStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HistoryConfig::default();
//! let mut history = VersionHistory::open(JsonStorage::new(".citadelle"), &config).await?;
//!
//! let v1 = history
//!     .create_version("doc_1", "Draft", ContentNode::from_lines(["Article 1"]), VersionKind::Manual)
//!     .await?
//!     .version;
//! let v2 = history
//!     .create_version("doc_1", "Review", ContentNode::from_lines(["Article 1", "Article 2"]), VersionKind::Manual)
//!     .await?
//!     .version;
//!
//! if let Some(diff) = history.diff_versions(&v1.id, &v2.id) {
//!     print!("{}", diff.render());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod content;
pub mod diff;
mod error;
pub mod extract;
mod history;
pub mod restore;
mod store;
pub mod version;

pub use config::{HistoryConfig, OverflowPolicy};
pub use content::ContentNode;
pub use diff::{diff_contents, diff_texts, ContentDiff, DiffLine, DiffOptions, DiffTag};
pub use error::{ConfigError, HistoryError, HistoryResult};
pub use extract::extract_plain_text;
pub use history::{VersionHistory, CHECKPOINT_LABEL, HISTORY_FORMAT};
pub use restore::{Document, LiveDocuments, OpenDocuments, RestoreOutcome};
pub use store::{CreateOutcome, VersionStore};
pub use version::{AutoReason, Version, VersionId, VersionKind};
