//! Tradable units and their precision

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CoinType;
use crate::crypto::keys::ethereum;
use crate::error::{Error, Result};

/// Largest scale a `Decimal` can carry
const MAX_SCALE: u32 = 28;

/// A tradable unit: a chain's native asset or an ERC-20 token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    /// Ticker code
    pub code: String,
    /// Chain family
    pub coin_type: CoinType,
    /// Number of decimal places of the base unit
    pub scale: u32,
    /// Smallest transferable amount
    pub min_value: Decimal,
    /// Token contract, `None` for the chain's native asset
    pub contract_address: Option<String>,
}

impl Coin {
    fn native(code: &str, coin_type: CoinType, scale: u32) -> Self {
        Self {
            code: code.to_string(),
            coin_type,
            scale,
            min_value: Decimal::new(1, scale),
            contract_address: None,
        }
    }

    pub fn btc() -> Self {
        Self::native("BTC", CoinType::Btc, 8)
    }

    pub fn ltc() -> Self {
        Self::native("LTC", CoinType::Ltc, 8)
    }

    pub fn eth() -> Self {
        Self::native("ETH", CoinType::Eth, 18)
    }

    /// Tether USD
    pub fn usdt() -> Self {
        Self::erc20_unchecked("USDT", 6, "0xdAC17F958D2ee523a2206206994597C13D831ec7")
    }

    /// USD Coin
    pub fn usdc() -> Self {
        Self::erc20_unchecked("USDC", 6, "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48")
    }

    /// Wrapped BTC
    pub fn wbtc() -> Self {
        Self::erc20_unchecked("WBTC", 8, "0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599")
    }

    fn erc20_unchecked(code: &str, scale: u32, contract: &str) -> Self {
        Self {
            code: code.to_string(),
            coin_type: CoinType::Eth,
            scale,
            min_value: Decimal::new(1, scale),
            contract_address: Some(contract.to_string()),
        }
    }

    /// Define an ERC-20 token by code, decimals and contract address
    pub fn erc20(code: &str, scale: u32, contract_address: &str) -> Result<Self> {
        if scale > MAX_SCALE {
            return Err(Error::InvalidParameter(format!(
                "Token scale {} exceeds the supported maximum of {}",
                scale, MAX_SCALE
            )));
        }
        if !ethereum::is_address_syntax_valid(contract_address) {
            return Err(Error::InvalidAddress(format!(
                "Token contract address {} is invalid",
                contract_address
            )));
        }
        Ok(Self::erc20_unchecked(code, scale, contract_address))
    }

    /// Whether this is the chain's native asset rather than a token
    pub fn is_native(&self) -> bool {
        self.contract_address.is_none()
    }
}
