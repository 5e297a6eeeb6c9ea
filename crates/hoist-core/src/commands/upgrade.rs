//! Upgrade command implementation.

use std::path::PathBuf;

use serde::Serialize;

use crate::context::DeployContext;
use crate::error::{Error, Result};
use crate::signer::Signer;
use crate::submit::published_package_id;
use crate::transaction::{UpgradePolicy, build_upgrade};
use crate::types::{ObjectId, PackageId};

/// Options for the upgrade command
#[derive(Debug, Clone)]
pub struct UpgradeOptions {
    /// Package being upgraded
    pub package_id: PackageId,
    /// Upgrade capability of that package, owned by the signer
    pub cap_id: ObjectId,
    /// Package source directory
    pub path: PathBuf,
    pub policy: UpgradePolicy,
}

impl UpgradeOptions {
    pub fn new(package_id: PackageId, cap_id: ObjectId, path: impl Into<PathBuf>) -> Self {
        Self {
            package_id,
            cap_id,
            path: path.into(),
            policy: UpgradePolicy::default(),
        }
    }

    /// Set the upgrade policy
    pub fn with_policy(mut self, policy: UpgradePolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Result of an upgrade
#[derive(Debug, Clone, Serialize)]
pub struct UpgradeReport {
    /// Package that was upgraded
    pub package_id: String,
    /// Id of the new package version, when the result names exactly one
    pub new_package_id: Option<String>,
    /// Transaction digest
    pub digest: String,
    pub policy: UpgradePolicy,
    /// Non-fatal issues noticed along the way
    pub warnings: Vec<String>,
}

/// Upgrade command orchestrator
#[derive(Debug, Clone)]
pub struct UpgradeCommand {
    context: DeployContext,
}

impl UpgradeCommand {
    pub fn new(context: DeployContext) -> Self {
        Self { context }
    }

    /// Upgrade with the signer selected by the context.
    pub async fn run(&self, options: &UpgradeOptions) -> Result<UpgradeReport> {
        let signer = self.context.signer()?;
        self.run_with_signer(signer.as_ref(), options).await
    }

    pub async fn run_with_signer(
        &self,
        signer: &dyn Signer,
        options: &UpgradeOptions,
    ) -> Result<UpgradeReport> {
        let package = options.package_id.to_short_literal();
        tracing::debug!(
            %package,
            cap = %options.cap_id,
            policy = %options.policy,
            "upgrading package"
        );

        // The capability's version moves on every use; read it right before assembly.
        let capability = self.context.ledger().object_ref(&options.cap_id).await?;

        let artifact = self.context.build_adapter().build(&options.path).await?;
        let transaction = build_upgrade(&artifact, options.package_id, capability, options.policy)?;
        let result = self.context.submitter().submit(&transaction, signer).await?;

        let mut warnings = Vec::new();
        let new_package_id = match published_package_id(&result) {
            Ok(id) => Some(id),
            Err(Error::AmbiguousPublishResult { count }) => {
                tracing::warn!(count, digest = %result.digest, "upgrade result names no single new package");
                warnings.push(format!(
                    "upgrade succeeded but the result lists {count} published packages"
                ));
                None
            }
            Err(e) => return Err(e),
        };

        tracing::info!(
            %package,
            new_package = new_package_id.as_deref().unwrap_or("unknown"),
            digest = %result.digest,
            "package upgraded"
        );

        Ok(UpgradeReport {
            package_id: package,
            new_package_id,
            digest: result.digest,
            policy: options.policy,
            warnings,
        })
    }
}
