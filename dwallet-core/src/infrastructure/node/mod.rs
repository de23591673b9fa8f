//! Remote node collaborator
//!
//! The core reaches the configured network node through the `NodeClient`
//! trait: nonce lookup, balance queries, chain identification, and raw
//! transaction broadcast. Every call carries a bounded timeout; expiry
//! surfaces as `NodeUnreachable`, never a hung caller.
//!
//! Idempotent reads retry transient transport failures with exponential
//! backoff. `broadcast` never retries: a transaction whose delivery status
//! is unknown must not be resent, the node's own duplicate and nonce
//! rejection is the safety net.

use crate::shared::constants::{NODE_READ_RETRY_ATTEMPTS, NODE_READ_RETRY_BASE_DELAY_MS};
use crate::shared::error::WalletError;
use crate::shared::types::{Balance, TransactionHash};
use crate::shared::WalletResult;
use async_trait::async_trait;
use ethers::types::U256;
use serde_json::json;
use std::time::Duration;

#[async_trait]
pub trait NodeClient: Send + Sync {
    /// The account's next nonce as observed by the node (pending count).
    async fn get_nonce(&self, address: &str) -> WalletResult<u64>;

    /// The account balance in wei, as a decimal string.
    async fn get_balance(&self, address: &str) -> WalletResult<Balance>;

    /// Submit a raw signed transaction. Exactly one attempt.
    async fn broadcast(&self, raw_tx: &[u8]) -> WalletResult<TransactionHash>;

    /// The network's chain identifier.
    async fn chain_id(&self) -> WalletResult<u64>;
}

/// JSON-RPC 2.0 client over HTTP for Ethereum-family nodes.
pub struct JsonRpcNodeClient {
    client: reqwest::Client,
    url: String,
}

impl JsonRpcNodeClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> WalletResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WalletError::config(format!("Failed to build RPC client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn request(&self, method: &str, params: serde_json::Value) -> WalletResult<serde_json::Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });
        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;
        let resp_json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| WalletError::node_unreachable(format!("Invalid node response: {}", e)))?;
        extract_result(resp_json)
    }

    // Bounded retry with exponential backoff, for idempotent reads only.
    async fn request_with_retry(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> WalletResult<serde_json::Value> {
        let mut delay = Duration::from_millis(NODE_READ_RETRY_BASE_DELAY_MS);
        let mut last_err = None;
        for attempt in 1..=NODE_READ_RETRY_ATTEMPTS {
            match self.request(method, params.clone()).await {
                Ok(result) => return Ok(result),
                Err(WalletError::NodeUnreachable(reason)) => {
                    log::warn!(
                        "{} attempt {}/{} failed: {}",
                        method,
                        attempt,
                        NODE_READ_RETRY_ATTEMPTS,
                        reason
                    );
                    last_err = Some(WalletError::NodeUnreachable(reason));
                    if attempt < NODE_READ_RETRY_ATTEMPTS {
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
                // Content-level rejections are terminal, never retried.
                Err(e) => return Err(e),
            }
        }
        Err(last_err
            .unwrap_or_else(|| WalletError::node_unreachable("RPC retries exhausted".to_string())))
    }
}

#[async_trait]
impl NodeClient for JsonRpcNodeClient {
    async fn get_nonce(&self, address: &str) -> WalletResult<u64> {
        let result = self
            .request_with_retry("eth_getTransactionCount", json!([address, "pending"]))
            .await?;
        parse_quantity_u64(&result)
    }

    async fn get_balance(&self, address: &str) -> WalletResult<Balance> {
        let result = self
            .request_with_retry("eth_getBalance", json!([address, "latest"]))
            .await?;
        Ok(parse_quantity_u256(&result)?.to_string())
    }

    async fn broadcast(&self, raw_tx: &[u8]) -> WalletResult<TransactionHash> {
        let tx_hex = format!("0x{}", hex::encode(raw_tx));
        let result = self
            .request("eth_sendRawTransaction", json!([tx_hex]))
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| WalletError::node_unreachable("No transaction hash returned".to_string()))
    }

    async fn chain_id(&self) -> WalletResult<u64> {
        let result = self.request_with_retry("eth_chainId", json!([])).await?;
        parse_quantity_u64(&result)
    }
}

fn map_transport_error(err: reqwest::Error) -> WalletError {
    if err.is_timeout() {
        WalletError::node_unreachable("Node request timed out".to_string())
    } else if err.is_connect() {
        WalletError::node_unreachable(format!("Failed to connect to node: {}", err))
    } else {
        WalletError::node_unreachable(format!("Node request failed: {}", err))
    }
}

// Pull `result` out of a JSON-RPC envelope; an `error` member carries the
// node's reason verbatim.
fn extract_result(resp_json: serde_json::Value) -> WalletResult<serde_json::Value> {
    if let Some(error) = resp_json.get("error") {
        let reason = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(WalletError::rejected_by_node(reason));
    }
    resp_json
        .get("result")
        .cloned()
        .ok_or_else(|| WalletError::node_unreachable("Node response missing result".to_string()))
}

fn parse_quantity_u64(value: &serde_json::Value) -> WalletResult<u64> {
    let text = value
        .as_str()
        .ok_or_else(|| WalletError::node_unreachable("Expected hex quantity".to_string()))?;
    u64::from_str_radix(text.trim_start_matches("0x"), 16)
        .map_err(|_| WalletError::node_unreachable(format!("Invalid hex quantity: {}", text)))
}

fn parse_quantity_u256(value: &serde_json::Value) -> WalletResult<U256> {
    let text = value
        .as_str()
        .ok_or_else(|| WalletError::node_unreachable("Expected hex quantity".to_string()))?;
    let clean = text.trim_start_matches("0x");
    // Nodes emit minimal-length quantities; pad odd digit counts for decode.
    let padded = if clean.len() % 2 == 1 {
        format!("0{}", clean)
    } else {
        clean.to_string()
    };
    let bytes = hex::decode(&padded)
        .map_err(|_| WalletError::node_unreachable(format!("Invalid hex quantity: {}", text)))?;
    if bytes.len() > 32 {
        return Err(WalletError::node_unreachable(format!(
            "Hex quantity too wide: {}",
            text
        )));
    }
    Ok(U256::from_big_endian(&bytes))
}
