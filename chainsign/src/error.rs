//! Error types for the chainsign library

use thiserror::Error;

/// Custom error type for chainsign operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Caller input outside the accepted domain (e.g. mnemonic length)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid extended key: {0}")]
    InvalidExtendedKey(String),

    /// A UTXO, receiver or transfer field failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported address type: {0}")]
    UnsupportedAddressType(String),

    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),

    /// The ledger lookup failed or did not know the transaction
    #[error("Upstream resolution failure: {0}")]
    UpstreamResolutionFailure(String),

    /// The referenced output is not P2PK, P2PKH or P2WPKH
    #[error("Unsignable script: {0}")]
    UnsignableScript(String),

    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    #[error("Signing error: {0}")]
    Signing(String),

    /// A self-check on generated output failed
    #[error("Internal validation failure: {0}")]
    InternalValidationFailure(String),
}

/// Result type for chainsign operations
pub type Result<T> = std::result::Result<T, Error>;
