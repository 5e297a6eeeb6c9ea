//! Ledger boundary: execution results, object changes, and the client trait
//! the submitter talks to.

mod network;
pub mod rpc;

use async_trait::async_trait;
use serde::Deserialize;

pub use network::Network;
pub use rpc::JsonRpcLedger;

use crate::error::Result;
use crate::signer::Signature;
use crate::types::{Identity, ObjectId, ObjectRef, deserialize_u64_string};

/// Operations the deployment pipeline needs from a ledger full node.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Current reference gas price.
    async fn reference_gas_price(&self) -> Result<u64>;

    /// Gas coins owned by `owner`.
    async fn gas_coins(&self, owner: &Identity) -> Result<Vec<GasCoin>>;

    /// Latest reference (version + digest) of an owned object.
    async fn object_ref(&self, id: &ObjectId) -> Result<ObjectRef>;

    /// Submit signed transaction bytes and wait for execution.
    async fn execute(&self, tx_bytes: &[u8], signatures: &[Signature]) -> Result<ExecutionResult>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasCoin {
    pub object_ref: ObjectRef,
    pub balance: u64,
}

/// Ledger verdict on a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecutionStatus {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExecutionStatus {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            status: "failure".to_string(),
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Outcome of one executed transaction. Consumed once by the result
/// interpreter; nothing is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Transaction digest, base58.
    pub digest: String,
    pub status: ExecutionStatus,
    /// Object changes in ledger order.
    pub object_changes: Vec<ObjectChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ObjectChange {
    Published {
        /// Package id exactly as reported; may carry zero padding.
        package_id: String,
        #[serde(deserialize_with = "deserialize_u64_string")]
        version: u64,
        #[serde(default)]
        modules: Vec<String>,
    },
    Created {
        object_id: ObjectId,
        object_type: String,
        #[serde(deserialize_with = "deserialize_u64_string")]
        version: u64,
    },
    Mutated {
        object_id: ObjectId,
        object_type: String,
        #[serde(deserialize_with = "deserialize_u64_string")]
        version: u64,
    },
    Transferred {
        object_id: ObjectId,
        object_type: String,
    },
    Deleted {
        object_id: ObjectId,
    },
    Wrapped {
        object_id: ObjectId,
    },
    #[serde(other)]
    Other,
}

impl ObjectChange {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Published { .. } => "published",
            Self::Created { .. } => "created",
            Self::Mutated { .. } => "mutated",
            Self::Transferred { .. } => "transferred",
            Self::Deleted { .. } => "deleted",
            Self::Wrapped { .. } => "wrapped",
            Self::Other => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_changes_deserialize_from_rpc_shape() {
        let json = serde_json::json!([
            {
                "type": "published",
                "packageId": "0x00abc",
                "version": "1",
                "digest": "7K8c",
                "modules": ["coin"]
            },
            {
                "type": "created",
                "sender": "0x1",
                "owner": { "AddressOwner": "0x1" },
                "objectType": "0x2::package::UpgradeCap",
                "objectId": "0x5",
                "version": "3",
                "digest": "7K8c"
            },
            {
                "type": "mutated",
                "objectType": "0x2::coin::Coin<0x2::sui::SUI>",
                "objectId": "0x6",
                "version": 4
            },
            { "type": "unwrappedThenDeleted", "objectId": "0x7" }
        ]);

        let changes: Vec<ObjectChange> = serde_json::from_value(json).unwrap();
        assert_eq!(changes.len(), 4);
        assert_eq!(
            changes[0],
            ObjectChange::Published {
                package_id: "0x00abc".to_string(),
                version: 1,
                modules: vec!["coin".to_string()],
            }
        );
        assert_eq!(changes[1].kind(), "created");
        assert!(matches!(changes[2], ObjectChange::Mutated { version: 4, .. }));
        assert_eq!(changes[3], ObjectChange::Other);
    }

    #[test]
    fn status_success_check() {
        assert!(ExecutionStatus::success().is_success());
        assert!(!ExecutionStatus::failure("MoveAbort").is_success());
    }
}
