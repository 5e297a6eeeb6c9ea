//! Hoist Core Library
//!
//! Builds Move packages, assembles publish and upgrade transactions for an
//! object-capability ledger, signs them with an in-memory key or a hardware
//! device, and interprets the execution result.

pub mod build;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod ledger;
pub mod signer;
pub mod submit;
pub mod transaction;
pub mod types;

pub use error::{Error, Result, RetrySafety};

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigFile, ConfigScope, ConfigStore, DeployConfig, load_layered};
    pub use crate::context::DeployContext;

    // Commands
    pub use crate::commands::{
        AddressCommand, AddressReport, PublishCommand, PublishOptions, PublishReport,
        UpgradeCommand, UpgradeOptions, UpgradeReport,
    };

    // Signing
    pub use crate::signer::{
        DerivationPath, HardwareSigner, PublicKey, Signature, Signer, SignerKind, SoftwareSigner,
    };

    // Build and transactions
    pub use crate::build::{ArtifactDescriptor, BuildAdapter};
    pub use crate::transaction::{Transaction, TransactionBuilder, UpgradePolicy};

    // Ledger
    pub use crate::ledger::{ExecutionResult, LedgerClient, Network, ObjectChange};
    pub use crate::submit::Submitter;
    pub use crate::types::{Address, Identity, ObjectId, ObjectRef, PackageId};

    pub use crate::error::{Error, Result, RetrySafety};
}
