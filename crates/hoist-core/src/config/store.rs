//! Config store for locating and loading hoist.toml.

use std::path::{Path, PathBuf};

use super::{
    ConfigFile, ConfigScope, DeployConfig, parser, paths::config_path_for_scope,
};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    scope: ConfigScope,
    config_path: PathBuf,
}

impl ConfigStore {
    pub fn from_paths(scope: ConfigScope, global_dir: &Path, project_root: &Path) -> Self {
        Self {
            scope,
            config_path: config_path_for_scope(scope, global_dir, project_root),
        }
    }

    /// Store for an explicit file, treated as project scope.
    pub fn from_file(path: PathBuf) -> Self {
        Self {
            scope: ConfigScope::Project,
            config_path: path,
        }
    }

    pub fn scope(&self) -> ConfigScope {
        self.scope
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn load(&self) -> anyhow::Result<ConfigFile> {
        if !self.config_path.exists() {
            return Ok(ConfigFile::new());
        }
        parser::parse_hoist_toml(&self.config_path)
    }
}

/// Load global then project config (or an explicit file instead of the
/// project one) and resolve defaults.
pub fn load_layered(
    global_dir: &Path,
    project_root: &Path,
    explicit: Option<&Path>,
) -> anyhow::Result<DeployConfig> {
    let global = ConfigStore::from_paths(ConfigScope::Global, global_dir, project_root).load()?;
    let project_store = match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            ConfigStore::from_file(path.to_path_buf())
        }
        None => ConfigStore::from_paths(ConfigScope::Project, global_dir, project_root),
    };
    let project = project_store.load()?;

    tracing::debug!(
        project = %project_store.config_path().display(),
        "loaded configuration"
    );
    global.merge(project).resolve()
}
