//! Ethereum JSON-RPC attribute reads

use super::abi::{self, Token};
use super::{Address, AttributeSource};
use crate::error::ReadError;
use async_trait::async_trait;
use hnforge_metadata::DynamicAttributes;
use hnforge_traits::EntityId;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

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

/// One entry of an `eth_getLogs` result
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcLog {
    /// Hex topics, `topics[0]` is the event signature hash
    pub topics: Vec<String>,
    /// Hex non-indexed data
    pub data: String,
    /// Hex block number
    #[serde(rename = "blockNumber", default)]
    pub block_number: Option<String>,
}

/// JSON-RPC 2.0 client over HTTP POST
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    /// Create client for `url`
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), url)
    }

    /// Create client sharing an existing HTTP connection pool
    #[must_use]
    pub fn with_http(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Endpoint URL
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Issue `method` with `params` and return its `result`
    ///
    /// # Errors
    /// `Unavailable` on transport or HTTP failure, `Rpc` on an error object,
    /// `Decode` on a malformed response
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ReadError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});

        let response = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ReadError::Unavailable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReadError::Unavailable(format!("{method}: HTTP {status}")));
        }
        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| ReadError::Decode(e.to_string()))?;

        if let Some(err) = body.error {
            return Err(ReadError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        body.result
            .ok_or_else(|| ReadError::Decode(format!("{method}: response has no result")))
    }

    /// `eth_call` against the latest block, returning raw return data
    ///
    /// # Errors
    /// See [`RpcClient::request`]
    pub async fn eth_call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>, ReadError> {
        let params = json!([{"to": to.to_string(), "data": format!("0x{}", hex::encode(data))}, "latest"]);
        let result = self.request("eth_call", params).await?;
        let text = result
            .as_str()
            .ok_or_else(|| ReadError::Decode("eth_call result is not a string".into()))?;
        abi::parse_hex_data(text)
    }

    /// Latest block number
    ///
    /// # Errors
    /// See [`RpcClient::request`]
    pub async fn block_number(&self) -> Result<u64, ReadError> {
        let result = self.request("eth_blockNumber", json!([])).await?;
        let text = result
            .as_str()
            .ok_or_else(|| ReadError::Decode("eth_blockNumber result is not a string".into()))?;
        abi::parse_quantity(text)
    }

    /// Logs of `address` in `[from, to]` whose first topic is one of `topics`
    ///
    /// # Errors
    /// See [`RpcClient::request`]
    pub async fn get_logs(
        &self,
        address: Address,
        topics: &[String],
        from: u64,
        to: u64,
    ) -> Result<Vec<RpcLog>, ReadError> {
        let filter = json!({
            "address": address.to_string(),
            "fromBlock": abi::quantity(from),
            "toBlock": abi::quantity(to),
            "topics": [topics],
        });
        let result = self.request("eth_getLogs", json!([filter])).await?;
        serde_json::from_value(result).map_err(|e| ReadError::Decode(e.to_string()))
    }
}

/// Contract function signatures used for attribute reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractCalls {
    /// Returns `uint256[]` scores, `[hc, btc]`
    pub hashrates: String,
    /// Returns a `uint256` keyed by `(id, string)`
    pub data: String,
    /// Returns the current `uint256` level
    pub level: String,
    /// Key passed to `data` for the ultra flag
    pub ultra_key: String,
}

impl Default for ContractCalls {
    fn default() -> Self {
        Self {
            hashrates: "getHashrates(uint256)".to_string(),
            data: "data(uint256,string)".to_string(),
            level: "level(uint256)".to_string(),
            ultra_key: "ultra".to_string(),
        }
    }
}

/// [`AttributeSource`] reading an entity contract over JSON-RPC
#[derive(Debug, Clone)]
pub struct RpcAttributeSource {
    client: RpcClient,
    contract: Address,
    calls: ContractCalls,
}

impl RpcAttributeSource {
    /// Create source for `contract`
    #[must_use]
    pub fn new(client: RpcClient, contract: Address) -> Self {
        Self {
            client,
            contract,
            calls: ContractCalls::default(),
        }
    }

    /// With custom function signatures
    #[inline]
    #[must_use]
    pub fn with_calls(mut self, calls: ContractCalls) -> Self {
        self.calls = calls;
        self
    }

    async fn scores(&self, id: EntityId) -> Result<[u64; 2], ReadError> {
        let data = abi::encode_call(&self.calls.hashrates, &[Token::Uint(id.get())]);
        let rates = abi::decode_uint_array(&self.client.eth_call(self.contract, &data).await?)?;
        Ok([
            rates.first().copied().unwrap_or(0),
            rates.get(1).copied().unwrap_or(0),
        ])
    }

    async fn ultra(&self, id: EntityId) -> Result<bool, ReadError> {
        let data = abi::encode_call(
            &self.calls.data,
            &[Token::Uint(id.get()), Token::Str(&self.calls.ultra_key)],
        );
        let flag = abi::decode_uint(&self.client.eth_call(self.contract, &data).await?)?;
        Ok(flag == 1)
    }
}

#[async_trait]
impl AttributeSource for RpcAttributeSource {
    async fn attributes(&self, id: EntityId) -> Result<DynamicAttributes, ReadError> {
        let (scores, ultra) = futures::try_join!(self.scores(id), self.ultra(id))?;
        Ok(DynamicAttributes {
            scores,
            ultra,
            name: None,
        })
    }

    async fn level(&self, id: EntityId) -> Result<u8, ReadError> {
        let data = abi::encode_call(&self.calls.level, &[Token::Uint(id.get())]);
        let level = abi::decode_uint(&self.client.eth_call(self.contract, &data).await?)?;
        u8::try_from(level).map_err(|_| ReadError::Decode(format!("level {level} out of range")))
    }
}
