//! JSON-RPC ledger provider for ChainSign Core
//!
//! Resolves previous UTXO transactions with `getrawtransaction` against a
//! Bitcoin Core compatible node (bitcoind, litecoind, or a hosted gateway).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use chainsign::error::{Error, Result};
use chainsign::network::Network;
use chainsign::transaction::{LedgerProvider, ProviderConfig};

/// Header carrying the provider API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// `RPC_INVALID_ADDRESS_OR_KEY`, returned for unknown transactions
const RPC_NOT_FOUND: i64 = -5;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// RPC error
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error("Failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("JSON-RPC error {code}: {message}")]
    Node { code: i64, message: String },

    #[error("Malformed transaction hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

impl From<RpcError> for Error {
    fn from(err: RpcError) -> Self {
        Error::UpstreamResolutionFailure(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

/// Interpret a `getrawtransaction` response body
///
/// An unknown transaction is `Ok(None)`, not an error.
pub fn parse_rpc_response(body: &str) -> std::result::Result<Option<Vec<u8>>, RpcError> {
    let response: RpcResponse = serde_json::from_str(body)?;

    if let Some(error) = response.error {
        if error.code == RPC_NOT_FOUND {
            return Ok(None);
        }
        return Err(RpcError::Node {
            code: error.code,
            message: error.message,
        });
    }

    match response.result {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => Ok(Some(hex::decode(raw.trim())?)),
        Some(other) => Err(RpcError::Node {
            code: 0,
            message: format!("expected a hex string, got {}", other),
        }),
    }
}

/// Ledger provider backed by a JSON-RPC node
pub struct JsonRpcLedgerProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl JsonRpcLedgerProvider {
    /// Create a new provider
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidParameter(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create a provider from `CHAINSIGN_RPC_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(ProviderConfig::from_env()?)
    }

    /// The configuration this provider was built from
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Send a JSON-RPC request and return the raw response body
    async fn send_request(&self, network: Network, method: &str, params: Vec<Value>) -> std::result::Result<String, RpcError> {
        let request = json!({
            "jsonrpc": "1.0",
            "id": "chainsign",
            "method": method,
            "params": params,
        });

        let mut builder = self.client.post(self.config.endpoint(network)).json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.header(API_KEY_HEADER, api_key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        accept_response(status, body)
    }
}

/// Gate a response body on its HTTP status
///
/// A failed status is passed through only when it carries a JSON-RPC error
/// object; Bitcoin Core answers unknown transactions with a 500 and an error
/// body.
fn accept_response(status: StatusCode, body: String) -> std::result::Result<String, RpcError> {
    if status.is_success() {
        return Ok(body);
    }
    match serde_json::from_str::<RpcResponse>(&body) {
        Ok(RpcResponse { error: Some(_), .. }) => Ok(body),
        _ => Err(RpcError::Status(status.as_u16())),
    }
}

#[async_trait]
impl LedgerProvider for JsonRpcLedgerProvider {
    #[instrument(skip(self, network), fields(network = %network))]
    async fn fetch_transaction(&self, network: Network, tx_hash: &str) -> Result<Option<Vec<u8>>> {
        let body = self
            .send_request(network, "getrawtransaction", vec![json!(tx_hash)])
            .await
            .map_err(|e| {
                warn!(error = %e, "Ledger request failed");
                e
            })?;

        let raw = parse_rpc_response(&body)?;
        debug!(found = raw.is_some(), "Ledger lookup complete");
        Ok(raw)
    }
}
