//! JSON-RPC client for a Sui full node.
//!
//! Covers the handful of read endpoints needed to resolve transaction inputs
//! plus dry run and execution. Responses are decoded into narrow typed views;
//! the raw execution result is kept alongside for printing.

use crate::error::{Result, SweepError};
use crate::transaction::SignedTransaction;
use crate::types::{Digest, ObjectId, ObjectRef, SuiAddress};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// JSON-RPC code used when the node answers with something that is not JSON-RPC.
pub const INVALID_RESPONSE_CODE: i64 = -32700;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Big integers arrive as decimal strings; some nodes send plain numbers.
fn u64_from_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => s.parse().map_err(serde::de::Error::custom),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom("expected unsigned integer")),
        other => Err(serde::de::Error::custom(format!(
            "expected integer, got {}",
            other
        ))),
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coin {
    pub coin_type: String,
    pub coin_object_id: String,
    #[serde(deserialize_with = "u64_from_string_or_number")]
    pub version: u64,
    pub digest: String,
    #[serde(deserialize_with = "u64_from_string_or_number")]
    pub balance: u64,
}

impl Coin {
    pub fn object_ref(&self) -> Result<ObjectRef> {
        Ok(ObjectRef {
            object_id: self.coin_object_id.parse()?,
            version: self.version,
            digest: Digest::from_base58(&self.digest)?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinPage {
    pub data: Vec<Coin>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_next_page: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectData {
    pub object_id: String,
    #[serde(deserialize_with = "u64_from_string_or_number")]
    pub version: u64,
    pub digest: String,
    #[serde(default)]
    pub owner: Option<Value>,
}

impl ObjectData {
    /// `initial_shared_version` when the owner is `{"Shared": {...}}`.
    pub fn initial_shared_version(&self) -> Option<u64> {
        let shared = self.owner.as_ref()?.get("Shared")?;
        let version = shared.get("initial_shared_version")?;
        match version {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ObjectResponse {
    #[serde(default)]
    data: Option<ObjectData>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionStatus {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExecutionStatus {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasCostSummary {
    #[serde(deserialize_with = "u64_from_string_or_number")]
    pub computation_cost: u64,
    #[serde(deserialize_with = "u64_from_string_or_number")]
    pub storage_cost: u64,
    #[serde(deserialize_with = "u64_from_string_or_number")]
    pub storage_rebate: u64,
}

impl GasCostSummary {
    /// Net gas charged; negative when the rebate exceeds the costs.
    pub fn net_gas_usage(&self) -> i128 {
        i128::from(self.computation_cost) + i128::from(self.storage_cost)
            - i128::from(self.storage_rebate)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effects {
    pub status: ExecutionStatus,
    #[serde(default)]
    pub gas_used: Option<GasCostSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DryRunResponse {
    pub effects: Effects,
}

/// Result of `sui_executeTransactionBlock`.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub digest: String,
    pub effects: Option<Effects>,
    pub raw: Value,
}

pub struct SuiRpcClient {
    url: String,
    http_client: Client,
    next_id: AtomicU64,
}

impl SuiRpcClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http_client, url))
    }

    pub fn with_client(client: Client, url: &str) -> Self {
        SuiRpcClient {
            url: url.to_string(),
            http_client: client,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http_client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SweepError::NetworkError(format!("{} to {}: {}", method, self.url, e)))?;

        let status = response.status();
        let body = response.text().await?;
        debug!(method, %status, bytes = body.len(), "RPC response");

        let parsed: RpcResponse = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                SweepError::RpcError {
                    code: INVALID_RESPONSE_CODE,
                    message: format!("{} returned invalid JSON-RPC: {}", method, e),
                }
            } else {
                SweepError::NetworkError(format!("{} failed with HTTP {}", method, status))
            }
        })?;

        if let Some(error) = parsed.error {
            return Err(SweepError::RpcError {
                code: error.code,
                message: format!("{}: {}", method, error.message),
            });
        }

        let result = parsed.result.ok_or_else(|| SweepError::RpcError {
            code: INVALID_RESPONSE_CODE,
            message: format!("{} returned neither result nor error", method),
        })?;
        serde_json::from_value(result).map_err(|e| SweepError::RpcError {
            code: INVALID_RESPONSE_CODE,
            message: format!("{} returned an unexpected result: {}", method, e),
        })
    }

    pub async fn reference_gas_price(&self) -> Result<u64> {
        #[derive(Deserialize)]
        struct Price(#[serde(deserialize_with = "u64_from_string_or_number")] u64);

        let price: Price = self.call("suix_getReferenceGasPrice", json!([])).await?;
        Ok(price.0)
    }

    pub async fn get_coins(
        &self,
        owner: SuiAddress,
        coin_type: &str,
        cursor: Option<&str>,
    ) -> Result<CoinPage> {
        self.call(
            "suix_getCoins",
            json!([owner.to_string(), coin_type, cursor, Value::Null]),
        )
        .await
    }

    /// Walks every page of the owner's coins of `coin_type`.
    pub async fn get_all_coins(&self, owner: SuiAddress, coin_type: &str) -> Result<Vec<Coin>> {
        let mut coins = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.get_coins(owner, coin_type, cursor.as_deref()).await?;
            coins.extend(page.data);
            match page.next_cursor {
                Some(next) if page.has_next_page => {
                    if cursor.as_deref() == Some(next.as_str()) {
                        warn!(cursor = %next, "Coin paging did not advance; stopping");
                        break;
                    }
                    cursor = Some(next);
                }
                _ => break,
            }
        }
        Ok(coins)
    }

    pub async fn get_object(&self, id: ObjectId) -> Result<ObjectData> {
        let response: ObjectResponse = self
            .call(
                "sui_getObject",
                json!([id.to_string(), { "showOwner": true }]),
            )
            .await?;

        match (response.data, response.error) {
            (Some(data), _) => Ok(data),
            (None, Some(error)) => Err(SweepError::InvalidObject(format!("{}: {}", id, error))),
            (None, None) => Err(SweepError::InvalidObject(format!("{} not found", id))),
        }
    }

    pub async fn dry_run(&self, tx_bytes_base64: &str) -> Result<DryRunResponse> {
        self.call("sui_dryRunTransactionBlock", json!([tx_bytes_base64]))
            .await
    }

    pub async fn execute(&self, signed: &SignedTransaction) -> Result<ExecutionOutcome> {
        let raw: Value = self
            .call(
                "sui_executeTransactionBlock",
                json!([
                    signed.tx_bytes_base64(),
                    signed.signatures_base64(),
                    { "showEffects": true, "showBalanceChanges": true },
                    "WaitForLocalExecution"
                ]),
            )
            .await?;

        let digest = raw
            .get("digest")
            .and_then(Value::as_str)
            .ok_or_else(|| SweepError::RpcError {
                code: INVALID_RESPONSE_CODE,
                message: "sui_executeTransactionBlock result has no digest".to_string(),
            })?
            .to_string();
        let effects = match raw.get("effects") {
            Some(effects) => Some(serde_json::from_value(effects.clone())?),
            None => None,
        };

        Ok(ExecutionOutcome {
            digest,
            effects,
            raw,
        })
    }
}
