//! Command handlers for the citadelle CLI.

pub mod config;
pub mod diff;
pub mod logging;
pub mod restore;
pub mod version;

pub use config::*;
pub use diff::*;
pub use logging::*;
pub use restore::*;
pub use version::*;

use citadelle_history::{HistoryConfig, VersionHistory, VersionId};
use citadelle_storage::JsonStorage;
use citadelle_util::{IdPrefix, Identifier};

/// Everything a command needs: the loaded history and output settings.
pub struct Context {
    pub history: VersionHistory<JsonStorage>,
    pub config: HistoryConfig,
    pub json: bool,
}

impl Context {
    pub async fn open(config: HistoryConfig, json: bool) -> anyhow::Result<Self> {
        let Some(dir) = config.history_dir() else {
            anyhow::bail!("Could not determine a data directory, pass --data-dir");
        };
        tracing::debug!(path = %dir.display(), "Using history directory");
        let history = VersionHistory::open(JsonStorage::new(dir), &config).await?;
        Ok(Self {
            history,
            config,
            json,
        })
    }

    /// Look up a version, failing with a readable message when it is unknown.
    pub fn version(&self, id: &str) -> anyhow::Result<&citadelle_history::Version> {
        if !Identifier::has_prefix(id, IdPrefix::Version) {
            anyhow::bail!("Not a version id: {id}");
        }
        self.history
            .get(&VersionId::from_string(id))
            .ok_or_else(|| anyhow::anyhow!("Version not found: {id}"))
    }
}
