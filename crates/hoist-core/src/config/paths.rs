//! Config path resolution helpers.

use std::path::{Path, PathBuf};

use super::ConfigScope;

pub const CONFIG_FILE_NAME: &str = "hoist.toml";

pub fn config_path_for_scope(scope: ConfigScope, global_dir: &Path, project_root: &Path) -> PathBuf {
    match scope {
        ConfigScope::Global => global_dir.join(CONFIG_FILE_NAME),
        ConfigScope::Project => project_root.join(CONFIG_FILE_NAME),
    }
}

/// `<config dir>/hoist`, falling back to `~/.config/hoist`.
pub fn default_global_dir(home_dir: &Path) -> PathBuf {
    dirs::config_dir()
        .map(|p| p.join("hoist"))
        .unwrap_or_else(|| home_dir.join(".config").join("hoist"))
}
