//! ChainSign Core - HD wallet derivation and offline transaction signing
//!
//! This library derives BIP32/44 keys from BIP39 mnemonics, renders BTC, LTC
//! and ETH addresses and private keys, and signs raw UTXO and EVM (ETH and
//! ERC-20) transactions ready to broadcast. Private keys never leave the
//! process; the only I/O is the injected [`LedgerProvider`] used to look up
//! the outputs a UTXO transaction spends.

pub mod error;
pub mod network;
pub mod crypto;
pub mod account;
pub mod transaction;

// Re-export commonly used types for convenience
pub use error::{Error, Result};
pub use network::{AddressType, Coin, CoinType, Network};

pub use crypto::mnemonic::{generate_mnemonic, is_mnemonic_valid};
pub use account::{
    address_from_private_key, generate_address, generate_extended_public_key, generate_private_key,
    is_address_valid, is_extended_public_key_valid, is_private_key_valid,
};
pub use transaction::{
    sign_evm_transaction, sign_utxo_transaction, EvmTransfer, LedgerProvider, ProviderConfig,
    SignedTransaction, TransactionReceiver, UtxoReference,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
