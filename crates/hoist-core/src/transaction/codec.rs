//! Canonical binary encoding of transactions.
//!
//! The ledger expects BCS: little-endian integers, ULEB128 lengths and
//! variant tags, struct fields in declaration order. The wire layout is
//! therefore the `Serialize` derive of the model types in this module's
//! parent, so field and variant order there is part of the format.

use serde::Serialize;

use crate::error::Result;

/// Intent prefix for signing transaction data: scope, version, app id.
pub const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

/// Bytes handed to the signer for `tx_bytes`.
pub fn intent_message(tx_bytes: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(TRANSACTION_INTENT.len() + tx_bytes.len());
    message.extend_from_slice(&TRANSACTION_INTENT);
    message.extend_from_slice(tx_bytes);
    message
}

pub fn to_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(bcs::to_bytes(value)?)
}
