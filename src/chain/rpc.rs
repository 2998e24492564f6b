//! JSON-RPC transport for the chain adapter
//!
//! Thin typed wrapper over an Ethereum node's HTTP endpoint. Only the five
//! methods the adapter needs are exposed; everything else stays with the
//! node. Transaction signing uses the node's transient password unlock
//! (`personal_sendTransaction`), so no key material lives in this process.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::types::{LightstreamsError, Result};

/// Interval between receipt polls
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Outbound transaction parameters
///
/// Gas is always a fixed integer ceiling chosen per operation by the
/// adapter; the transport never estimates.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub gas: u64,
    pub data: Bytes,
}

impl TransactionRequest {
    fn to_params(&self) -> Value {
        let mut tx = json!({
            "to": self.to,
            "gas": format!("0x{:x}", self.gas),
            "data": self.data,
        });
        if let Some(from) = self.from {
            tx["from"] = json!(from);
        }
        tx
    }
}

/// Mined transaction receipt, reduced to what the adapter inspects
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionReceipt {
    #[serde(deserialize_with = "deserialize_status")]
    pub status: bool,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

/// One log entry from a receipt
#[derive(Debug, Clone, Deserialize)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

fn deserialize_status<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw == "0x1")
}

/// Read and write access to an Ethereum node
#[async_trait]
pub trait EthRpc: Send + Sync {
    /// Read-only contract call; returns the raw ABI-encoded result
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    /// Submit a transaction from the node's default account
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256>;

    /// Submit a transaction with a transient password unlock of `tx.from`
    async fn personal_send_transaction(&self, tx: TransactionRequest, password: &str)
        -> Result<B256>;

    /// Fetch the receipt for a mined transaction, `None` while pending
    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>>;

    /// Poll for a receipt until mined or the deadline passes
    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt>;
}

/// JSON-RPC error object returned by the node
#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    error: Option<RpcErrorBody>,
}

/// reqwest-backed JSON-RPC client
pub struct JsonRpcClient {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
    receipt_timeout: Duration,
}

impl JsonRpcClient {
    pub fn new(url: &str, timeout: Duration, receipt_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LightstreamsError::Config(format!("RPC client build failed: {}", e)))?;

        Ok(Self {
            url: url.to_string(),
            http,
            next_id: AtomicU64::new(1),
            receipt_timeout,
        })
    }

    /// Raw request; a null result is passed through for the caller to judge
    async fn request_value(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "Chain RPC request");

        let response = self
            .http
            .post(&self.url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            }))
            .send()
            .await
            .map_err(|e| LightstreamsError::ChainTx(format!("RPC transport error: {}", e)))?;

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| LightstreamsError::ChainTx(format!("Malformed RPC response: {}", e)))?;

        if let Some(error) = body.error {
            return Err(LightstreamsError::ChainTx(format!(
                "{} failed: {}",
                method, error.message
            )));
        }

        Ok(body.result)
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let result = self.request_value(method, params).await?;
        if result.is_null() {
            return Err(LightstreamsError::ChainTx(format!(
                "{} returned no result",
                method
            )));
        }

        serde_json::from_value(result)
            .map_err(|e| LightstreamsError::ChainTx(format!("Unexpected {} result: {}", method, e)))
    }
}

#[async_trait]
impl EthRpc for JsonRpcClient {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        self.request(
            "eth_call",
            json!([{ "to": to, "data": data }, "latest"]),
        )
        .await
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256> {
        self.request("eth_sendTransaction", json!([tx.to_params()]))
            .await
    }

    async fn personal_send_transaction(
        &self,
        tx: TransactionRequest,
        password: &str,
    ) -> Result<B256> {
        // The password rides along for this single call; the node relocks
        // the account as soon as the transaction is signed.
        self.request(
            "personal_sendTransaction",
            json!([tx.to_params(), password]),
        )
        .await
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
        let result = self
            .request_value("eth_getTransactionReceipt", json!([hash]))
            .await?;

        // Pending transactions come back as a null result, not an error
        if result.is_null() {
            return Ok(None);
        }

        let receipt = serde_json::from_value(result).map_err(|e| {
            LightstreamsError::ChainTx(format!("Unexpected eth_getTransactionReceipt result: {}", e))
        })?;
        Ok(Some(receipt))
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt> {
        let deadline = tokio::time::Instant::now() + self.receipt_timeout;

        loop {
            if let Some(receipt) = self.transaction_receipt(hash).await? {
                return Ok(receipt);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(LightstreamsError::ChainTx(format!(
                    "Timed out waiting for receipt of {}",
                    hash
                )));
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}
