//! Deployment configuration.
//!
//! Two scopes are layered, project over global:
//! - Global: `<config dir>/hoist/hoist.toml`
//! - Project: `./hoist.toml`, usually committed next to the package
//!
//! Files hold optional values only ([`ConfigFile`]); defaults are applied
//! when the merged file is resolved into a [`DeployConfig`]. Frontends apply
//! their own overrides (flags, environment) on the resolved value.

pub mod parser;
pub mod paths;
pub mod schema;
pub mod store;

use serde::{Deserialize, Serialize};

pub use parser::{parse_hoist_toml, parse_hoist_toml_str};
pub use paths::config_path_for_scope;
pub use schema::{ConfigFile, DeployConfig, SecretText, SignerConfig, SignerSection};
pub use store::{ConfigStore, load_layered};

/// Configuration scope levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigScope {
    /// User-wide configuration
    Global,
    /// Configuration next to the package being deployed
    Project,
}
