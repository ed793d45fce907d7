//! History configuration.
//!
//! Configuration is loaded from multiple sources and merged, later sources
//! winning key by key:
//! 1. Global config: `<config_dir>/citadelle/history.json`
//! 2. Project config: `citadelle.jsonc` or `citadelle.json` in the project directory
//! 3. Environment overrides: `CITADELLE_HISTORY_CAPACITY`, `CITADELLE_HISTORY_OVERFLOW`,
//!    `CITADELLE_LOG_LEVEL`
//!
//! Files may contain `//` and `/* */` comments.

use crate::diff::DiffOptions;
use crate::error::{ConfigError, HistoryResult};
use citadelle_util::log::LogLevel;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default number of versions kept per document.
pub const DEFAULT_CAPACITY: usize = 50;

/// Default storage key for the version collection.
pub const DEFAULT_STORAGE_KEY: &str = "citadelle-versions";

/// Default `m * n` size past which a diff carries a scale warning.
pub const DEFAULT_DIFF_WARN_CELLS: u64 = 4_000_000;

pub const ENV_CAPACITY: &str = "CITADELLE_HISTORY_CAPACITY";
pub const ENV_OVERFLOW: &str = "CITADELLE_HISTORY_OVERFLOW";
pub const ENV_LOG_LEVEL: &str = "CITADELLE_LOG_LEVEL";

/// Longest accepted retention for automatic versions, about a thousand years.
pub const MAX_AUTO_RETENTION_DAYS: u32 = 365_000;

/// What to do when a document is at capacity and holds no automatic version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Insert anyway and flag the document as over capacity.
    #[default]
    AllowGrowth,
    /// Evict the oldest version regardless of kind.
    EvictOldest,
    /// Refuse the new version.
    Reject,
}

impl OverflowPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverflowPolicy::AllowGrowth => "allow_growth",
            OverflowPolicy::EvictOldest => "evict_oldest",
            OverflowPolicy::Reject => "reject",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "allow_growth" => Some(OverflowPolicy::AllowGrowth),
            "evict_oldest" => Some(OverflowPolicy::EvictOldest),
            "reject" => Some(OverflowPolicy::Reject),
            _ => None,
        }
    }
}

/// Version history settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Versions kept per document before eviction kicks in.
    pub capacity: usize,

    /// Behaviour at capacity when nothing is evictable.
    pub overflow: OverflowPolicy,

    /// Storage key the collection is persisted under.
    pub storage_key: String,

    /// Diff size (old lines x new lines) that triggers a scale warning.
    pub diff_warn_cells: u64,

    /// Age after which `prune` drops automatic versions.
    pub auto_retention_days: u32,

    /// Directory holding the persisted history. Defaults to the platform data dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            overflow: OverflowPolicy::AllowGrowth,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            diff_warn_cells: DEFAULT_DIFF_WARN_CELLS,
            auto_retention_days: 7,
            data_dir: None,
            log_level: None,
        }
    }
}

impl HistoryConfig {
    /// Load configuration from the global config dir, the project dir and the environment.
    pub async fn load(project_dir: Option<&Path>) -> HistoryResult<(Self, Vec<PathBuf>)> {
        let global_dir = citadelle_util::path::config_dir();
        let (mut config, sources) = Self::load_from(global_dir.as_deref(), project_dir).await?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok((config, sources))
    }

    /// Load and merge config files without consulting the environment.
    pub async fn load_from(
        global_dir: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> HistoryResult<(Self, Vec<PathBuf>)> {
        let mut candidates = Vec::new();
        if let Some(dir) = global_dir {
            candidates.push(vec![dir.join("history.json")]);
        }
        if let Some(dir) = project_dir {
            candidates.push(vec![dir.join("citadelle.jsonc"), dir.join("citadelle.json")]);
        }

        let mut merged = Value::Object(Default::default());
        let mut sources = Vec::new();

        for group in candidates {
            if let Some(path) = first_existing(&group).await {
                let content = tokio::fs::read_to_string(&path)
                    .await
                    .map_err(ConfigError::from)?;
                let value = parse_jsonc(&content, &path.display().to_string())?;
                merge_values(&mut merged, value);
                debug!(path = %path.display(), "Loaded history config");
                sources.push(path);
            }
        }

        let config = serde_json::from_value(merged).map_err(|e| ConfigError::InvalidJson {
            path: sources
                .last()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<defaults>".to_string()),
            message: e.to_string(),
        })?;

        Ok((config, sources))
    }

    /// Apply environment-style overrides through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(raw) = lookup(ENV_CAPACITY) {
            self.capacity = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid_value(ENV_CAPACITY, &raw))?;
        }
        if let Some(raw) = lookup(ENV_OVERFLOW) {
            self.overflow = OverflowPolicy::parse(&raw)
                .ok_or_else(|| ConfigError::invalid_value(ENV_OVERFLOW, &raw))?;
        }
        if let Some(raw) = lookup(ENV_LOG_LEVEL) {
            let level: LogLevel = raw
                .parse()
                .map_err(|_| ConfigError::invalid_value(ENV_LOG_LEVEL, &raw))?;
            self.log_level = Some(level);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::invalid_value("capacity", self.capacity));
        }
        if self.auto_retention_days > MAX_AUTO_RETENTION_DAYS {
            return Err(ConfigError::invalid_value(
                "auto_retention_days",
                self.auto_retention_days,
            ));
        }
        // The key becomes a file name with `.json` appended in place of any suffix.
        let key = self.storage_key.as_str();
        if key.is_empty() || key.contains(['/', '\\', '.']) {
            return Err(ConfigError::invalid_value("storage_key", key));
        }
        Ok(())
    }

    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            warn_cells: self.diff_warn_cells,
        }
    }

    /// Where the history is persisted.
    pub fn history_dir(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(citadelle_util::path::history_dir)
    }
}

async fn first_existing(paths: &[PathBuf]) -> Option<PathBuf> {
    for path in paths {
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Some(path.clone());
        }
    }
    None
}

/// Overlay `other` onto `base`, recursing into objects.
fn merge_values(base: &mut Value, other: Value) {
    match (base, other) {
        (Value::Object(base), Value::Object(other)) => {
            for (key, value) in other {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, other) => *base = other,
    }
}

fn parse_jsonc(content: &str, source: &str) -> Result<Value, ConfigError> {
    serde_json::from_str(&strip_comments(content)).map_err(|e| ConfigError::InvalidJson {
        path: source.to_string(),
        message: e.to_string(),
    })
}

/// Strip `//` and `/* */` comments outside of string literals.
fn strip_comments(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        result.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                result.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    if next == '\n' {
                        result.push('\n');
                    }
                    prev = next;
                }
            }
            _ => result.push(c),
        }
    }

    result
}
