//! Key derivation and management
//!
//! This module provides BIP32 derivation and the per-chain address and
//! private key codecs.

pub mod bitcoin;
pub mod ethereum;
mod derivation;
mod extended;

pub use derivation::*;
pub use extended::*;
