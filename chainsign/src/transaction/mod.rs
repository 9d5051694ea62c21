//! Transaction functionality
//!
//! This module builds and signs raw transactions for UTXO chains and EVM
//! chains. Nothing here broadcasts.

pub mod types;
pub mod provider;
pub mod validation;
mod ethereum;
mod bitcoin;

pub use types::*;
pub use provider::*;
pub use ethereum::*;
pub use self::bitcoin::*;
