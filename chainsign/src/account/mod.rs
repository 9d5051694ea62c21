//! Account management functionality
//!
//! This module turns mnemonics and extended public keys into the addresses
//! and private keys of an HD account.

mod address;

pub use address::*;
