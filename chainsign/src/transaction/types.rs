//! Common transaction types

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::network::{Coin, CoinType};

/// An unspent output to spend, with the key that controls it
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoReference {
    /// Hash of the transaction that created the output
    pub tx_hash: String,
    /// Output index in that transaction
    pub index: i64,
    /// WIF private key controlling the output
    pub private_key: String,
}

impl UtxoReference {
    pub fn new(tx_hash: impl Into<String>, index: i64, private_key: impl Into<String>) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            index,
            private_key: private_key.into(),
        }
    }
}

impl fmt::Debug for UtxoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UtxoReference")
            .field("tx_hash", &self.tx_hash)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// A payment destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceiver {
    /// Destination address
    pub address: String,
    /// Amount in whole coins
    pub amount: Decimal,
}

impl TransactionReceiver {
    pub fn new(address: impl Into<String>, amount: Decimal) -> Self {
        Self {
            address: address.into(),
            amount,
        }
    }
}

/// An ETH or ERC-20 transfer to sign
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmTransfer {
    /// `0x`-prefixed hex private key of the sender
    pub from_private_key: String,
    /// Recipient address
    pub to_address: String,
    /// Amount in whole coins or tokens
    pub amount: Decimal,
    /// Native ETH or a token
    pub coin: Coin,
    pub nonce: i64,
    /// Gas price in wei
    pub gas_price: i128,
    pub gas_limit: i64,
}

impl fmt::Debug for EvmTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvmTransfer")
            .field("to_address", &self.to_address)
            .field("amount", &self.amount)
            .field("coin", &self.coin.code)
            .field("nonce", &self.nonce)
            .field("gas_price", &self.gas_price)
            .field("gas_limit", &self.gas_limit)
            .finish_non_exhaustive()
    }
}

/// A signed transaction ready for broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    /// Network serialized bytes
    pub raw: Vec<u8>,
    /// Transaction id (UTXO) or Keccak transaction hash (EVM)
    pub hash: String,
    /// Chain family of the transaction
    pub coin_type: CoinType,
}

impl SignedTransaction {
    /// Hex encoding of the raw bytes; `0x`-prefixed for EVM chains
    pub fn to_hex(&self) -> String {
        match self.coin_type {
            CoinType::Eth => format!("0x{}", hex::encode(&self.raw)),
            CoinType::Btc | CoinType::Ltc => hex::encode(&self.raw),
        }
    }
}
