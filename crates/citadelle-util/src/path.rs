//! Path utilities.

use std::path::PathBuf;

/// Get the citadelle configuration directory.
///
/// This follows XDG conventions on Linux/macOS:
/// - `$XDG_CONFIG_HOME/citadelle` if set
/// - `~/.config/citadelle` otherwise
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("citadelle"))
}

/// Get the citadelle data directory.
///
/// Version history lives under `<data_dir>/history`.
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|p| p.join("citadelle"))
}

/// Get the directory where version history is stored by default.
pub fn history_dir() -> Option<PathBuf> {
    data_dir().map(|p| p.join("history"))
}
