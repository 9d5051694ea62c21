//! Base58Check and hash helpers shared by the key codecs

use bitcoin::hashes::{hash160, Hash};
use sha2::{Digest, Sha256};
use sha3::Keccak256;

use crate::error::{Error, Result};

fn checksum(payload: &[u8]) -> [u8; 4] {
    let hash = Sha256::digest(Sha256::digest(payload));
    let mut checksum = [0u8; 4];
    checksum.copy_from_slice(&hash[0..4]);
    checksum
}

/// Encode `payload` as Base58 with a 4-byte double-SHA256 checksum
pub fn base58check_encode(payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(payload.len() + 4);
    data.extend_from_slice(payload);
    data.extend_from_slice(&checksum(payload));
    bs58::encode(data).into_string()
}

/// Decode a Base58Check string, returning the payload without checksum
pub fn base58check_decode(encoded: &str) -> Result<Vec<u8>> {
    let data = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| Error::InvalidParameter(format!("Invalid base58: {}", e)))?;

    if data.len() < 4 {
        return Err(Error::InvalidParameter("Base58 payload too short".to_string()));
    }

    let (payload, check) = data.split_at(data.len() - 4);
    if checksum(payload) != check {
        return Err(Error::InvalidParameter("Base58 checksum mismatch".to_string()));
    }

    Ok(payload.to_vec())
}

/// RIPEMD160(SHA256(data))
pub fn hash160(data: &[u8]) -> [u8; 20] {
    hash160::Hash::hash(data).to_byte_array()
}

/// Calculate the Keccak-256 hash of data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}
