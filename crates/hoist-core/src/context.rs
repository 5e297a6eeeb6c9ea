//! Deployment context for unified dependency injection.

use std::sync::Arc;

use crate::build::BuildAdapter;
use crate::config::DeployConfig;
use crate::error::{Error, Result};
use crate::ledger::{JsonRpcLedger, LedgerClient, Network};
use crate::signer::hardware::{DeviceConnector, TcpDeviceConnector};
use crate::signer::{HardwareSigner, Signer, SignerKind, SoftwareSigner};
use crate::submit::Submitter;

/// Shared services for one deployment invocation.
///
/// Frontends create this once from a resolved [`DeployConfig`] and pass it
/// to commands. The ledger client and the device connector can be replaced
/// for testing.
#[derive(Clone)]
pub struct DeployContext {
    config: DeployConfig,
    ledger: Arc<dyn LedgerClient>,
    device: Arc<dyn DeviceConnector>,
    force_hardware: bool,
}

impl DeployContext {
    /// Context talking to the configured JSON-RPC endpoint.
    pub fn new(config: DeployConfig) -> anyhow::Result<Self> {
        let url = config.rpc_url()?;
        let ledger = JsonRpcLedger::new(url)
            .map_err(|e| anyhow::anyhow!("Failed to create ledger client: {}", e))?;
        tracing::debug!(url = %ledger.url(), network = %config.network, "using ledger endpoint");
        Ok(Self::with_ledger(config, Arc::new(ledger)))
    }

    /// Context with an explicit ledger client.
    pub fn with_ledger(config: DeployConfig, ledger: Arc<dyn LedgerClient>) -> Self {
        let device = Arc::new(TcpDeviceConnector::new(config.signer.device.clone()));
        Self {
            config,
            ledger,
            device,
            force_hardware: false,
        }
    }

    pub fn with_device_connector(mut self, device: Arc<dyn DeviceConnector>) -> Self {
        self.device = device;
        self
    }

    /// Use the hardware signer regardless of network and configuration.
    pub fn with_force_hardware(mut self, force: bool) -> Self {
        self.force_hardware = force;
        self
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    pub fn network(&self) -> Network {
        self.config.network
    }

    pub fn ledger(&self) -> Arc<dyn LedgerClient> {
        Arc::clone(&self.ledger)
    }

    pub fn build_adapter(&self) -> BuildAdapter {
        let adapter = BuildAdapter::new(self.config.compiler.clone());
        match &self.config.build_dir {
            Some(dir) => adapter.with_scratch_root(dir),
            None => adapter,
        }
    }

    pub fn submitter(&self) -> Submitter {
        Submitter::new(self.ledger(), self.config.gas_budget)
    }

    pub fn signer_kind(&self) -> SignerKind {
        self.config.signer_kind(self.force_hardware)
    }

    /// Construct the signer selected by network and configuration.
    pub fn signer(&self) -> Result<Box<dyn Signer>> {
        let network = self.config.network;
        let signer: Box<dyn Signer> = match self.signer_kind() {
            SignerKind::Software => {
                let secret = self.config.signer.secret_key.as_ref().ok_or_else(|| {
                    Error::InvalidKey(
                        "no secret key configured (set signer.secret_key or HOIST_SECRET_KEY)"
                            .to_string(),
                    )
                })?;
                if network.is_production() {
                    tracing::warn!(%network, "using an in-memory key on a production network");
                }
                Box::new(SoftwareSigner::from_encoded(secret.expose(), network)?)
            }
            SignerKind::Hardware => Box::new(HardwareSigner::new(
                Arc::clone(&self.device),
                self.config.signer.derivation_path.clone(),
                self.config.signer.timeout,
                network,
            )),
        };
        tracing::debug!(kind = %self.signer_kind(), %network, "signer selected");
        Ok(signer)
    }
}

impl std::fmt::Debug for DeployContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployContext")
            .field("config", &self.config)
            .field("device", &self.device.describe())
            .field("force_hardware", &self.force_hardware)
            .finish_non_exhaustive()
    }
}
