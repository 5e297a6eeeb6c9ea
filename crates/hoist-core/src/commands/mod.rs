//! High-level commands for hoist operations.
//!
//! Each command takes a [`DeployContext`](crate::context::DeployContext)
//! and an options value and returns a serializable report, so the CLI can
//! render it as a table or JSON.

pub mod address;
pub mod publish;
pub mod upgrade;

pub use address::{AddressCommand, AddressReport};
pub use publish::{PublishCommand, PublishOptions, PublishReport};
pub use upgrade::{UpgradeCommand, UpgradeOptions, UpgradeReport};
