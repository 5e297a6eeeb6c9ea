//! Submission and result interpretation.
//!
//! [`Submitter::submit`] serializes a transaction with sender and gas,
//! has the signer sign the intent message, submits it and waits for
//! execution. Non-success statuses become [`Error::TransactionFailed`]
//! before any object change is looked at.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::ledger::{ExecutionResult, GasCoin, LedgerClient, ObjectChange};
use crate::signer::Signer;
use crate::transaction::codec::{self, intent_message};
use crate::transaction::{GasData, Transaction, TransactionData};
use crate::types::{Identity, ObjectId, normalize_package_id};

/// Default gas budget in the ledger's smallest unit.
pub const DEFAULT_GAS_BUDGET: u64 = 500_000_000;

const UPGRADE_CAP_SUFFIX: &str = "::package::UpgradeCap";

pub struct Submitter {
    ledger: Arc<dyn LedgerClient>,
    gas_budget: u64,
}

impl Submitter {
    pub fn new(ledger: Arc<dyn LedgerClient>, gas_budget: u64) -> Self {
        Self { ledger, gas_budget }
    }

    pub fn gas_budget(&self) -> u64 {
        self.gas_budget
    }

    /// Attach sender and gas to `transaction`, returning the bytes to sign.
    pub async fn prepare(&self, transaction: &Transaction, sender: Identity) -> Result<Vec<u8>> {
        let price = self.ledger.reference_gas_price().await?;
        let coins = self.ledger.gas_coins(&sender).await?;
        let coin = select_gas_coin(&coins, self.gas_budget).ok_or_else(|| Error::NoGasCoins {
            owner: sender.to_hex_literal(),
            budget: self.gas_budget,
        })?;

        let data = TransactionData {
            transaction: transaction.clone(),
            sender,
            gas: GasData {
                payment: vec![coin.object_ref],
                owner: sender,
                price,
                budget: self.gas_budget,
            },
        };
        codec::to_bytes(&data)
    }

    pub async fn submit(
        &self,
        transaction: &Transaction,
        signer: &dyn Signer,
    ) -> Result<ExecutionResult> {
        let sender = signer.identity().await?;
        let tx_bytes = self.prepare(transaction, sender).await?;
        let message = intent_message(&tx_bytes);

        let signature = signer.sign(&message).await?;
        signature.verify(&message, &sender)?;

        let labels: Vec<String> = transaction.commands().iter().map(|c| c.label()).collect();
        tracing::info!(sender = %sender, commands = ?labels, "submitting transaction");
        let result = self.ledger.execute(&tx_bytes, &[signature]).await?;

        ensure_success(&result)?;
        tracing::info!(digest = %result.digest, changes = result.object_changes.len(), "transaction executed");
        Ok(result)
    }
}

/// Richest coin that covers `budget` on its own.
pub fn select_gas_coin(coins: &[GasCoin], budget: u64) -> Option<&GasCoin> {
    coins
        .iter()
        .filter(|coin| coin.balance >= budget)
        .max_by_key(|coin| coin.balance)
}

pub fn ensure_success(result: &ExecutionResult) -> Result<()> {
    if result.status.is_success() {
        return Ok(());
    }
    Err(Error::TransactionFailed {
        status: result.status.status.clone(),
        detail: result
            .status
            .error
            .clone()
            .unwrap_or_else(|| format!("transaction {}", result.digest)),
    })
}

/// Normalized id of the single package a publish created.
///
/// Zero or several published changes is an invariant violation and is
/// reported rather than resolved by picking one.
pub fn published_package_id(result: &ExecutionResult) -> Result<String> {
    let published: Vec<&str> = result
        .object_changes
        .iter()
        .filter_map(|change| match change {
            ObjectChange::Published { package_id, .. } => Some(package_id.as_str()),
            _ => None,
        })
        .collect();

    match published.as_slice() {
        [package_id] => Ok(normalize_package_id(package_id)),
        other => Err(Error::AmbiguousPublishResult { count: other.len() }),
    }
}

/// The upgrade capability created by a publish, if the result lists one.
pub fn created_upgrade_cap(result: &ExecutionResult) -> Option<ObjectId> {
    result.object_changes.iter().find_map(|change| match change {
        ObjectChange::Created {
            object_id,
            object_type,
            ..
        } if object_type.ends_with(UPGRADE_CAP_SUFFIX) => Some(*object_id),
        _ => None,
    })
}
