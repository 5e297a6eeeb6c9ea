//! Configuration schema: raw file layer and resolved settings.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use url::Url;
use zeroize::Zeroize;

use crate::build::DEFAULT_COMPILER;
use crate::ledger::Network;
use crate::signer::SignerKind;
use crate::signer::hardware::{DEFAULT_DEVICE_TIMEOUT, DerivationPath};
use crate::submit::DEFAULT_GAS_BUDGET;

/// Default APDU-over-TCP endpoint for the signing device.
pub const DEFAULT_DEVICE_ADDRESS: &str = "127.0.0.1:9999";

/// Secret key text. Never printed, wiped on drop.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SecretText(String);

impl SecretText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretText(<redacted>)")
    }
}

impl Drop for SecretText {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// `[signer]` table as written in `hoist.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignerSection {
    #[serde(default)]
    pub kind: Option<SignerKind>,
    #[serde(default)]
    pub secret_key: Option<SecretText>,
    #[serde(default)]
    pub derivation_path: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// One `hoist.toml`. Every value is optional so scopes can be layered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub network: Option<Network>,
    #[serde(default)]
    pub rpc_url: Option<Url>,
    #[serde(default)]
    pub compiler: Option<String>,
    #[serde(default)]
    pub gas_budget: Option<u64>,
    #[serde(default)]
    pub build_dir: Option<PathBuf>,
    #[serde(default)]
    pub signer: SignerSection,
}

impl ConfigFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay `other` on top of `self`; values set in `other` win.
    pub fn merge(mut self, other: ConfigFile) -> Self {
        self.network = other.network.or(self.network);
        self.rpc_url = other.rpc_url.or(self.rpc_url);
        self.compiler = other.compiler.or(self.compiler);
        self.gas_budget = other.gas_budget.or(self.gas_budget);
        self.build_dir = other.build_dir.or(self.build_dir);

        let signer = other.signer;
        self.signer.kind = signer.kind.or(self.signer.kind);
        self.signer.secret_key = signer.secret_key.or(self.signer.secret_key.take());
        self.signer.derivation_path = signer.derivation_path.or(self.signer.derivation_path.take());
        self.signer.device = signer.device.or(self.signer.device.take());
        self.signer.timeout_secs = signer.timeout_secs.or(self.signer.timeout_secs);
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(url) = &self.rpc_url {
            if !matches!(url.scheme(), "http" | "https") {
                anyhow::bail!("rpc_url must use http or https, got '{}'", url.scheme());
            }
        }
        if self.gas_budget == Some(0) {
            anyhow::bail!("gas_budget must be greater than zero");
        }
        if let Some(compiler) = &self.compiler {
            if compiler.trim().is_empty() {
                anyhow::bail!("compiler must not be empty");
            }
        }
        if let Some(path) = &self.signer.derivation_path {
            path.parse::<DerivationPath>()
                .map_err(|e| anyhow::anyhow!("signer.derivation_path: {}", e))?;
        }
        if self.signer.timeout_secs == Some(0) {
            anyhow::bail!("signer.timeout_secs must be greater than zero");
        }
        Ok(())
    }

    /// Apply defaults.
    pub fn resolve(self) -> anyhow::Result<DeployConfig> {
        self.validate()?;
        let defaults = DeployConfig::default();
        let derivation_path = match self.signer.derivation_path.as_deref() {
            Some(path) => path
                .parse::<DerivationPath>()
                .map_err(|e| anyhow::anyhow!("signer.derivation_path: {}", e))?,
            None => defaults.signer.derivation_path.clone(),
        };

        Ok(DeployConfig {
            network: self.network.unwrap_or(defaults.network),
            rpc_url: self.rpc_url,
            compiler: self.compiler.unwrap_or(defaults.compiler),
            gas_budget: self.gas_budget.unwrap_or(defaults.gas_budget),
            build_dir: self.build_dir,
            signer: SignerConfig {
                kind: self.signer.kind,
                secret_key: self.signer.secret_key,
                derivation_path,
                device: self.signer.device.unwrap_or(defaults.signer.device),
                timeout: self
                    .signer
                    .timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.signer.timeout),
            },
        })
    }
}

/// Signer settings after defaults.
#[derive(Debug, Clone)]
pub struct SignerConfig {
    /// Requested backend; `None` picks by network.
    pub kind: Option<SignerKind>,
    pub secret_key: Option<SecretText>,
    pub derivation_path: DerivationPath,
    pub device: String,
    pub timeout: Duration,
}

/// Resolved configuration passed explicitly into commands.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub network: Network,
    pub rpc_url: Option<Url>,
    pub compiler: String,
    pub gas_budget: u64,
    /// Parent of per-build scratch directories; the system temp dir if unset.
    pub build_dir: Option<PathBuf>,
    pub signer: SignerConfig,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            kind: None,
            secret_key: None,
            derivation_path: DerivationPath::default(),
            device: DEFAULT_DEVICE_ADDRESS.to_string(),
            timeout: DEFAULT_DEVICE_TIMEOUT,
        }
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            rpc_url: None,
            compiler: DEFAULT_COMPILER.to_string(),
            gas_budget: DEFAULT_GAS_BUDGET,
            build_dir: None,
            signer: SignerConfig::default(),
        }
    }
}

impl DeployConfig {
    /// Re-check values that overrides may have changed after resolution.
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(url) = &self.rpc_url {
            if !matches!(url.scheme(), "http" | "https") {
                anyhow::bail!("rpc_url must use http or https, got '{}'", url.scheme());
            }
        }
        if self.gas_budget == 0 {
            anyhow::bail!("gas_budget must be greater than zero");
        }
        if self.compiler.trim().is_empty() {
            anyhow::bail!("compiler must not be empty");
        }
        Ok(())
    }

    pub fn rpc_url(&self) -> anyhow::Result<Url> {
        match &self.rpc_url {
            Some(url) => Ok(url.clone()),
            None => Url::parse(self.network.default_rpc_url())
                .map_err(|e| anyhow::anyhow!("invalid default endpoint for {}: {}", self.network, e)),
        }
    }

    /// `force_hardware` wins, then an explicitly configured kind; otherwise
    /// mainnet signs on a device and test networks sign in software.
    pub fn signer_kind(&self, force_hardware: bool) -> SignerKind {
        if force_hardware {
            return SignerKind::Hardware;
        }
        match self.signer.kind {
            Some(kind) => kind,
            None if self.network.is_production() => SignerKind::Hardware,
            None => SignerKind::Software,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_resolves_to_defaults() {
        let config = ConfigFile::new().resolve().unwrap();
        assert_eq!(config.network, Network::Devnet);
        assert_eq!(config.compiler, DEFAULT_COMPILER);
        assert_eq!(config.gas_budget, DEFAULT_GAS_BUDGET);
        assert_eq!(config.signer.derivation_path, DerivationPath::default());
        assert_eq!(config.signer.timeout, DEFAULT_DEVICE_TIMEOUT);
        assert_eq!(
            config.rpc_url().unwrap().as_str(),
            "https://fullnode.devnet.sui.io/"
        );
    }

    #[test]
    fn merge_prefers_overlay_values() {
        let global = ConfigFile {
            network: Some(Network::Testnet),
            compiler: Some("sui".to_string()),
            signer: SignerSection {
                secret_key: Some(SecretText::new("global")),
                timeout_secs: Some(30),
                ..Default::default()
            },
            ..Default::default()
        };
        let project = ConfigFile {
            compiler: Some("cargo run --bin sui".to_string()),
            signer: SignerSection {
                kind: Some(SignerKind::Hardware),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = global.merge(project);
        assert_eq!(merged.network, Some(Network::Testnet));
        assert_eq!(merged.compiler.as_deref(), Some("cargo run --bin sui"));
        assert_eq!(merged.signer.kind, Some(SignerKind::Hardware));
        assert_eq!(merged.signer.secret_key.as_ref().map(|s| s.expose()), Some("global"));
        assert_eq!(merged.signer.timeout_secs, Some(30));
    }

    #[test]
    fn signer_kind_defaults_by_network() {
        let mut config = DeployConfig::default();
        assert_eq!(config.signer_kind(false), SignerKind::Software);
        assert_eq!(config.signer_kind(true), SignerKind::Hardware);

        config.network = Network::Mainnet;
        assert_eq!(config.signer_kind(false), SignerKind::Hardware);

        config.signer.kind = Some(SignerKind::Software);
        assert_eq!(config.signer_kind(false), SignerKind::Software);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let zero_budget = ConfigFile {
            gas_budget: Some(0),
            ..Default::default()
        };
        assert!(zero_budget.resolve().is_err());

        let ws = ConfigFile {
            rpc_url: Some(Url::parse("ws://localhost:9000").unwrap()),
            ..Default::default()
        };
        assert!(ws.validate().is_err());

        let bad_path = ConfigFile {
            signer: SignerSection {
                derivation_path: Some("44'/abc".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(bad_path.validate().is_err());
    }

    #[test]
    fn resolved_config_validation_catches_overrides() {
        let mut config = DeployConfig::default();
        assert!(config.validate().is_ok());
        config.gas_budget = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn secret_text_is_redacted() {
        let secret = SecretText::new("c2VjcmV0");
        assert_eq!(format!("{secret:?}"), "SecretText(<redacted>)");
    }
}
