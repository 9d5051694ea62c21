//! Ledger lookup provider

use std::env;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::network::Network;

/// Environment variable holding the provider URL
pub const ENV_RPC_URL: &str = "CHAINSIGN_RPC_URL";
/// Environment variable holding the provider API key
pub const ENV_RPC_API_KEY: &str = "CHAINSIGN_RPC_API_KEY";
/// Environment variable holding the request timeout in seconds
pub const ENV_RPC_TIMEOUT_SECS: &str = "CHAINSIGN_RPC_TIMEOUT_SECS";

/// Source of previous transactions for UTXO input resolution
#[async_trait]
pub trait LedgerProvider: Send + Sync {
    /// Fetch the raw serialized transaction with hash `tx_hash`
    ///
    /// Returns `Ok(None)` when the ledger does not know the transaction.
    async fn fetch_transaction(&self, network: Network, tx_hash: &str) -> Result<Option<Vec<u8>>>;
}

/// Provider type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// JSON-RPC over HTTP(S)
    #[default]
    Http,
}

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider type
    #[serde(default)]
    pub provider_type: ProviderType,
    /// Provider URL; `{coin}` is replaced with the network's coin code
    pub url: String,
    /// API key (if required)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl ProviderConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::Http,
            url: url.into(),
            api_key: None,
            timeout: None,
        }
    }

    /// Load the configuration from `CHAINSIGN_RPC_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let url = lookup(ENV_RPC_URL)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| Error::InvalidParameter(format!("{} is not set", ENV_RPC_URL)))?;

        let timeout = lookup(ENV_RPC_TIMEOUT_SECS)
            .map(|value| {
                value.trim().parse::<u64>().map_err(|_| {
                    Error::InvalidParameter(format!(
                        "{} must be a number of seconds, got {}",
                        ENV_RPC_TIMEOUT_SECS, value
                    ))
                })
            })
            .transpose()?;

        Ok(Self {
            provider_type: ProviderType::Http,
            url,
            api_key: lookup(ENV_RPC_API_KEY).filter(|key| !key.is_empty()),
            timeout,
        })
    }

    /// The endpoint serving `network`
    pub fn endpoint(&self, network: Network) -> String {
        self.url
            .replace("{coin}", &network.coin_type().code().to_lowercase())
    }
}
