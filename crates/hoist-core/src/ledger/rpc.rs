//! JSON-RPC full-node client.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use url::Url;

use super::{ExecutionResult, ExecutionStatus, GasCoin, LedgerClient, ObjectChange};
use crate::error::{Error, Result};
use crate::signer::Signature;
use crate::types::{Identity, ObjectDigest, ObjectId, ObjectRef, deserialize_u64_string};

const GAS_COIN_TYPE: &str = "0x2::sui::SUI";
const COINS_PAGE_LIMIT: u32 = 50;

#[derive(Debug)]
pub struct JsonRpcLedger {
    client: reqwest::Client,
    url: Url,
    next_id: AtomicU64,
}

impl JsonRpcLedger {
    pub fn new(url: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("hoist/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        tracing::debug!(method, id, "ledger rpc call");
        let response = self.client.post(self.url.clone()).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(Error::Rpc(format!(
                "{} returned HTTP {}",
                method,
                response.status()
            )));
        }

        let envelope: RpcEnvelope<T> = response.json().await?;
        if let Some(error) = envelope.error {
            return Err(Error::Rpc(format!(
                "{} failed ({}): {}",
                method, error.code, error.message
            )));
        }
        envelope
            .result
            .ok_or_else(|| Error::Rpc(format!("{method} returned neither result nor error")))
    }
}

#[derive(Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinPage {
    data: Vec<RawCoin>,
    next_cursor: Option<String>,
    #[serde(default)]
    has_next_page: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCoin {
    coin_object_id: ObjectId,
    #[serde(deserialize_with = "deserialize_u64_string")]
    version: u64,
    digest: ObjectDigest,
    #[serde(deserialize_with = "deserialize_u64_string")]
    balance: u64,
}

#[derive(Deserialize)]
struct ObjectResponse {
    data: Option<RawObject>,
    error: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawObject {
    object_id: ObjectId,
    #[serde(deserialize_with = "deserialize_u64_string")]
    version: u64,
    digest: ObjectDigest,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawExecution {
    digest: String,
    effects: Option<RawEffects>,
    #[serde(default)]
    object_changes: Vec<ObjectChange>,
}

#[derive(Deserialize)]
struct RawEffects {
    status: ExecutionStatus,
}

#[async_trait]
impl LedgerClient for JsonRpcLedger {
    async fn reference_gas_price(&self) -> Result<u64> {
        let price: Value = self.call("suix_getReferenceGasPrice", json!([])).await?;
        match price {
            Value::String(text) => text
                .parse()
                .map_err(|_| Error::Rpc(format!("invalid gas price: {text}"))),
            Value::Number(n) => n
                .as_u64()
                .ok_or_else(|| Error::Rpc(format!("invalid gas price: {n}"))),
            other => Err(Error::Rpc(format!("invalid gas price: {other}"))),
        }
    }

    async fn gas_coins(&self, owner: &Identity) -> Result<Vec<GasCoin>> {
        let mut coins = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page: CoinPage = self
                .call(
                    "suix_getCoins",
                    json!([owner.to_hex_literal(), GAS_COIN_TYPE, cursor, COINS_PAGE_LIMIT]),
                )
                .await?;
            coins.extend(page.data.into_iter().map(|coin| GasCoin {
                object_ref: ObjectRef {
                    object_id: coin.coin_object_id,
                    version: coin.version,
                    digest: coin.digest,
                },
                balance: coin.balance,
            }));
            if !page.has_next_page || page.next_cursor.is_none() {
                break;
            }
            cursor = page.next_cursor;
        }
        Ok(coins)
    }

    async fn object_ref(&self, id: &ObjectId) -> Result<ObjectRef> {
        let response: ObjectResponse = self
            .call("sui_getObject", json!([id.to_hex_literal(), {}]))
            .await?;
        match (response.data, response.error) {
            (Some(object), _) => Ok(ObjectRef {
                object_id: object.object_id,
                version: object.version,
                digest: object.digest,
            }),
            (None, Some(error)) => {
                tracing::debug!(object = %id, %error, "object lookup failed");
                Err(Error::ObjectNotFound(id.to_hex_literal()))
            }
            (None, None) => Err(Error::ObjectNotFound(id.to_hex_literal())),
        }
    }

    async fn execute(&self, tx_bytes: &[u8], signatures: &[Signature]) -> Result<ExecutionResult> {
        let signatures: Vec<String> = signatures.iter().map(Signature::to_base64).collect();
        let raw: RawExecution = self
            .call(
                "sui_executeTransactionBlock",
                json!([
                    BASE64.encode(tx_bytes),
                    signatures,
                    { "showEffects": true, "showObjectChanges": true },
                    "WaitForLocalExecution"
                ]),
            )
            .await?;

        let effects = raw.effects.ok_or_else(|| {
            Error::Rpc(format!("transaction {} returned no effects", raw.digest))
        })?;
        Ok(ExecutionResult {
            digest: raw.digest,
            status: effects.status,
            object_changes: raw.object_changes,
        })
    }
}
