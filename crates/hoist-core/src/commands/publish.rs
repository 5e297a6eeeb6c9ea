//! Publish command implementation.
//!
//! Builds a package with its unpublished dependencies bundled, publishes it
//! and hands the upgrade capability to the signer that submitted it.

use std::path::PathBuf;

use serde::Serialize;

use crate::context::DeployContext;
use crate::error::Result;
use crate::signer::Signer;
use crate::submit::{created_upgrade_cap, published_package_id};
use crate::transaction::build_publish;
use crate::types::{Identity, ObjectId};

/// Options for the publish command
#[derive(Debug, Clone)]
pub struct PublishOptions {
    /// Package source directory
    pub path: PathBuf,
}

impl PublishOptions {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Result of a publish
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    /// Normalized id of the new package
    pub package_id: String,
    /// Capability needed for future upgrades
    pub upgrade_cap: Option<ObjectId>,
    /// Transaction digest
    pub digest: String,
    /// Identity that signed and now holds the capability
    pub sender: Identity,
    /// Non-fatal issues noticed along the way
    pub warnings: Vec<String>,
}

/// Publish command orchestrator
#[derive(Debug, Clone)]
pub struct PublishCommand {
    context: DeployContext,
}

impl PublishCommand {
    pub fn new(context: DeployContext) -> Self {
        Self { context }
    }

    /// Publish with the signer selected by the context.
    pub async fn run(&self, options: &PublishOptions) -> Result<PublishReport> {
        let signer = self.context.signer()?;
        self.run_with_signer(signer.as_ref(), options).await
    }

    pub async fn run_with_signer(
        &self,
        signer: &dyn Signer,
        options: &PublishOptions,
    ) -> Result<PublishReport> {
        let sender = signer.identity().await?;
        tracing::debug!(%sender, path = %options.path.display(), "publishing package");

        let artifact = self
            .context
            .build_adapter()
            .with_unpublished_dependencies(true)
            .build(&options.path)
            .await?;

        let transaction = build_publish(&artifact, sender)?;
        let result = self.context.submitter().submit(&transaction, signer).await?;

        let package_id = published_package_id(&result)?;
        let upgrade_cap = created_upgrade_cap(&result);

        let mut warnings = Vec::new();
        if upgrade_cap.is_none() {
            tracing::warn!(%package_id, "publish result lists no upgrade capability");
            warnings.push("no upgrade capability found in the publish result".to_string());
        }

        tracing::info!(
            %package_id,
            digest = %result.digest,
            network = %self.context.network(),
            "package published"
        );

        Ok(PublishReport {
            package_id,
            upgrade_cap,
            digest: result.digest,
            sender,
            warnings,
        })
    }
}
