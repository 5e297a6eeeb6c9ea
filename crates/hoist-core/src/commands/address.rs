//! Address command: shows which identity the configured signer acts as.

use serde::Serialize;

use crate::context::DeployContext;
use crate::error::Result;
use crate::ledger::Network;
use crate::signer::{Signer, SignerKind};
use crate::types::Identity;

#[derive(Debug, Clone, Serialize)]
pub struct AddressReport {
    pub identity: Identity,
    /// Base64 public key
    pub public_key: String,
    pub kind: SignerKind,
    pub network: Network,
}

#[derive(Debug, Clone)]
pub struct AddressCommand {
    context: DeployContext,
}

impl AddressCommand {
    pub fn new(context: DeployContext) -> Self {
        Self { context }
    }

    pub async fn run(&self) -> Result<AddressReport> {
        let signer = self.context.signer()?;
        self.run_with_signer(signer.as_ref()).await
    }

    pub async fn run_with_signer(&self, signer: &dyn Signer) -> Result<AddressReport> {
        let public_key = signer.public_key().await?;
        Ok(AddressReport {
            identity: public_key.to_identity(),
            public_key: public_key.to_base64(),
            kind: self.context.signer_kind(),
            network: self.context.network(),
        })
    }
}
