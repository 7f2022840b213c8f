//! On-chain query tools for the Mantle RPC endpoint.
//!
//! Every operation here is defensive: failure paths degrade to a
//! descriptive string so the reasoning engine can incorporate the failure
//! into its answer instead of aborting.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;

use super::{Tool, required_str_arg};

const RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Wei per whole native unit (18 decimals).
const WEI_PER_UNIT: u128 = 1_000_000_000_000_000_000;

/// JSON-RPC client for an Ethereum-family endpoint.
pub struct Web3Client {
    http: reqwest::Client,
    provider_url: String,
    native_symbol: String,
}

impl std::fmt::Debug for Web3Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Web3Client")
            .field("provider_url", &self.provider_url)
            .field("native_symbol", &self.native_symbol)
            .finish()
    }
}

impl Web3Client {
    /// Create a client for the given provider URL and native unit symbol.
    #[must_use]
    pub fn new(provider_url: impl Into<String>, native_symbol: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(RPC_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            provider_url: provider_url.into(),
            native_symbol: native_symbol.into(),
        }
    }

    /// Issue a single JSON-RPC request and return the `result` member.
    async fn rpc(&self, method: &str, params: serde_json::Value) -> anyhow::Result<serde_json::Value> {
        let req = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        });

        let resp = self
            .http
            .post(&self.provider_url)
            .json(&req)
            .send()
            .await
            .with_context(|| format!("rpc {method} request failed"))?
            .error_for_status()
            .with_context(|| format!("rpc {method} returned error status"))?;

        let v: serde_json::Value = resp
            .json()
            .await
            .with_context(|| format!("rpc {method} response was not valid JSON"))?;

        if let Some(err) = v.get("error") {
            return Err(anyhow!("rpc {method} error: {err}"));
        }

        Ok(v.get("result").cloned().unwrap_or(serde_json::Value::Null))
    }

    /// Balance of an address, formatted in the native unit.
    ///
    /// An invalid address is rejected before any RPC traffic.
    pub async fn get_balance(&self, address: &str) -> String {
        if !is_address(address) {
            return "Invalid Mantle address.".to_string();
        }

        match self.rpc("eth_getBalance", serde_json::json!([address, "latest"])).await {
            Ok(result) => match result.as_str().and_then(parse_hex_u128) {
                Some(wei) => format!(
                    "Balance of {address}: {} {}",
                    format_units(wei),
                    self.native_symbol
                ),
                None => format!("Error fetching balance of {address}: unexpected result"),
            },
            Err(e) => format!("Error fetching balance of {address}: {e:#}"),
        }
    }

    /// Transaction details by hash, formatted as text.
    pub async fn get_transaction(&self, tx_hash: &str) -> String {
        if !is_hash(tx_hash) {
            return "Transaction not found or invalid hash.".to_string();
        }

        match self
            .rpc("eth_getTransactionByHash", serde_json::json!([tx_hash]))
            .await
        {
            Ok(serde_json::Value::Null) | Err(_) => {
                "Transaction not found or invalid hash.".to_string()
            }
            Ok(tx) => self.format_transaction(&tx),
        }
    }

    /// Block details by height, hash, or the `latest` tag, formatted as text.
    pub async fn get_block(&self, identifier: &str) -> String {
        let result = if let Ok(number) = identifier.parse::<u64>() {
            self.rpc(
                "eth_getBlockByNumber",
                serde_json::json!([format!("{number:#x}"), false]),
            )
            .await
        } else if is_hash(identifier) {
            self.rpc("eth_getBlockByHash", serde_json::json!([identifier, false]))
                .await
        } else if identifier == "latest" {
            self.rpc("eth_getBlockByNumber", serde_json::json!(["latest", false]))
                .await
        } else {
            return "Block not found or invalid identifier.".to_string();
        };

        match result {
            Ok(serde_json::Value::Null) | Err(_) => {
                "Block not found or invalid identifier.".to_string()
            }
            Ok(block) => format_block(&block),
        }
    }

    /// Current chain height.
    pub async fn get_latest_block_number(&self) -> String {
        match self.rpc("eth_blockNumber", serde_json::json!([])).await {
            Ok(result) => match result.as_str().and_then(parse_hex_u64) {
                Some(number) => format!("Latest Mantle block number: {number}"),
                None => "Error fetching latest block number: unexpected result".to_string(),
            },
            Err(e) => format!("Error fetching latest block number: {e:#}"),
        }
    }

    fn format_transaction(&self, tx: &serde_json::Value) -> String {
        let value = tx
            .get("value")
            .and_then(|v| v.as_str())
            .and_then(parse_hex_u128)
            .map_or_else(|| "-".to_string(), |wei| {
                format!("{} {}", format_units(wei), self.native_symbol)
            });

        format!(
            "Transaction details:\n  hash: {}\n  from: {}\n  to: {}\n  value: {value}\n  block: {}\n  nonce: {}",
            str_field(tx, "hash"),
            str_field(tx, "from"),
            str_field(tx, "to"),
            hex_field(tx, "blockNumber"),
            hex_field(tx, "nonce"),
        )
    }
}

fn format_block(block: &serde_json::Value) -> String {
    let tx_count = block
        .get("transactions")
        .and_then(|t| t.as_array())
        .map_or(0, Vec::len);

    format!(
        "Block details:\n  number: {}\n  hash: {}\n  parent: {}\n  timestamp: {}\n  gas used: {}\n  transactions: {tx_count}",
        hex_field(block, "number"),
        str_field(block, "hash"),
        str_field(block, "parentHash"),
        hex_field(block, "timestamp"),
        hex_field(block, "gasUsed"),
    )
}

fn str_field<'a>(v: &'a serde_json::Value, key: &str) -> &'a str {
    v.get(key).and_then(|x| x.as_str()).unwrap_or("-")
}

fn hex_field(v: &serde_json::Value, key: &str) -> String {
    v.get(key)
        .and_then(|x| x.as_str())
        .and_then(parse_hex_u128)
        .map_or_else(|| "-".to_string(), |n| n.to_string())
}

/// `0x` followed by exactly 40 hex digits.
fn is_address(s: &str) -> bool {
    s.len() == 42 && s.starts_with("0x") && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

/// `0x` followed by exactly 64 hex digits.
fn is_hash(s: &str) -> bool {
    s.len() == 66 && s.starts_with("0x") && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

fn parse_hex_u128(s: &str) -> Option<u128> {
    u128::from_str_radix(s.trim_start_matches("0x"), 16).ok()
}

fn parse_hex_u64(s: &str) -> Option<u64> {
    u64::from_str_radix(s.trim_start_matches("0x"), 16).ok()
}

/// Format a wei amount as a decimal native-unit string, trailing zeros
/// trimmed.
fn format_units(wei: u128) -> String {
    let whole = wei / WEI_PER_UNIT;
    let frac = wei % WEI_PER_UNIT;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{frac:018}");
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool wrappers
// ─────────────────────────────────────────────────────────────────────────────

/// `get_balance` tool.
#[derive(Debug)]
pub struct GetBalanceTool {
    client: Arc<Web3Client>,
}

impl GetBalanceTool {
    #[must_use]
    pub fn new(client: Arc<Web3Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetBalanceTool {
    fn name(&self) -> &str {
        "get_balance"
    }

    fn description(&self) -> &str {
        "Get the native-token balance of a Mantle address"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "address": { "type": "string", "description": "0x-prefixed account address" }
            },
            "required": ["address"]
        })
    }

    async fn call(&self, args: serde_json::Value) -> anyhow::Result<String> {
        let address = required_str_arg(&args, "address")?;
        Ok(self.client.get_balance(address).await)
    }
}

/// `get_transaction` tool.
#[derive(Debug)]
pub struct GetTransactionTool {
    client: Arc<Web3Client>,
}

impl GetTransactionTool {
    #[must_use]
    pub fn new(client: Arc<Web3Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetTransactionTool {
    fn name(&self) -> &str {
        "get_transaction"
    }

    fn description(&self) -> &str {
        "Get details of a transaction by its hash"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "tx_hash": { "type": "string", "description": "0x-prefixed transaction hash" }
            },
            "required": ["tx_hash"]
        })
    }

    async fn call(&self, args: serde_json::Value) -> anyhow::Result<String> {
        let tx_hash = required_str_arg(&args, "tx_hash")?;
        Ok(self.client.get_transaction(tx_hash).await)
    }
}

/// `get_block` tool.
#[derive(Debug)]
pub struct GetBlockTool {
    client: Arc<Web3Client>,
}

impl GetBlockTool {
    #[must_use]
    pub fn new(client: Arc<Web3Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetBlockTool {
    fn name(&self) -> &str {
        "get_block"
    }

    fn description(&self) -> &str {
        "Get details of a block by its number or hash"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "block_identifier": {
                    "type": "string",
                    "description": "Block number, 0x-prefixed block hash, or 'latest'"
                }
            },
            "required": ["block_identifier"]
        })
    }

    async fn call(&self, args: serde_json::Value) -> anyhow::Result<String> {
        let identifier = required_str_arg(&args, "block_identifier")?;
        Ok(self.client.get_block(identifier).await)
    }
}

/// `get_latest_block_number` tool.
#[derive(Debug)]
pub struct LatestBlockNumberTool {
    client: Arc<Web3Client>,
}

impl LatestBlockNumberTool {
    #[must_use]
    pub fn new(client: Arc<Web3Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for LatestBlockNumberTool {
    fn name(&self) -> &str {
        "get_latest_block_number"
    }

    fn description(&self) -> &str {
        "Get the latest block number on the Mantle network"
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn call(&self, _args: serde_json::Value) -> anyhow::Result<String> {
        Ok(self.client.get_latest_block_number().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_client() -> Web3Client {
        // Port 1 is never listening; RPC paths reached in tests fail fast.
        Web3Client::new("http://127.0.0.1:1", "MNT")
    }

    #[test]
    fn test_address_validation() {
        assert!(is_address("0x32400084c286cf3e17e7b677ea9583e60a000324"));
        assert!(!is_address("not-an-address"));
        assert!(!is_address("0x1234"));
        assert!(!is_address("0xzz400084c286cf3e17e7b677ea9583e60a000324"));
    }

    #[test]
    fn test_hash_validation() {
        let good = format!("0x{}", "ab".repeat(32));
        assert!(is_hash(&good));
        assert!(!is_hash("0xab"));
        assert!(!is_hash(&format!("0x{}", "zz".repeat(32))));
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(0), "0");
        assert_eq!(format_units(WEI_PER_UNIT), "1");
        assert_eq!(format_units(WEI_PER_UNIT * 25 / 10), "2.5");
        assert_eq!(format_units(1), "0.000000000000000001");
    }

    #[tokio::test]
    async fn test_invalid_address_never_hits_rpc() {
        let client = offline_client();
        let result = client.get_balance("not-an-address").await;
        assert_eq!(result, "Invalid Mantle address.");
    }

    #[tokio::test]
    async fn test_malformed_tx_hash_is_not_found() {
        let client = offline_client();
        let result = client.get_transaction("0xdeadbeef").await;
        assert_eq!(result, "Transaction not found or invalid hash.");
    }

    #[tokio::test]
    async fn test_unparseable_block_identifier_is_not_found() {
        let client = offline_client();
        let result = client.get_block("nonexistent").await;
        assert_eq!(result, "Block not found or invalid identifier.");
    }

    #[tokio::test]
    async fn test_unreachable_rpc_degrades_to_error_text() {
        let client = offline_client();
        let result = client.get_latest_block_number().await;
        assert!(result.starts_with("Error fetching latest block number:"));
    }

    #[test]
    fn test_format_block() {
        let block = serde_json::json!({
            "number": "0x10",
            "hash": "0xabc",
            "parentHash": "0xdef",
            "timestamp": "0x64",
            "gasUsed": "0x5208",
            "transactions": ["0x1", "0x2"]
        });
        let text = format_block(&block);
        assert!(text.contains("number: 16"));
        assert!(text.contains("timestamp: 100"));
        assert!(text.contains("transactions: 2"));
    }
}
