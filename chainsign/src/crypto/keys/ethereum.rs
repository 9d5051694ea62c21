//! Ethereum address and private key encoding

use ethers::types::Address;
use ethers::utils::to_checksum;
use secp256k1::{PublicKey, SecretKey};

use crate::crypto::encoding::keccak256;
use crate::error::{Error, Result};

/// Length of a `0x`-prefixed address string
pub const ADDRESS_LEN: usize = 42;

/// Get the checksummed Ethereum address of a public key
pub fn public_key_to_address(public_key: &PublicKey) -> String {
    // Skip the 0x04 prefix of the uncompressed encoding and hash the rest
    let key_hash = keccak256(&public_key.serialize_uncompressed()[1..]);
    let address = Address::from_slice(&key_hash[12..]);

    to_checksum(&address, None)
}

/// Encode a private key as `0x`-prefixed hex
pub fn encode_private_key(secret_key: &SecretKey) -> String {
    format!("0x{}", hex::encode(secret_key.secret_bytes()))
}

/// Decode a `0x`-prefixed hex private key (either prefix case)
pub fn decode_private_key(encoded: &str) -> Result<SecretKey> {
    let digits = encoded
        .strip_prefix("0x")
        .or_else(|| encoded.strip_prefix("0X"))
        .ok_or_else(|| Error::InvalidPrivateKey("Private key must start with 0x".to_string()))?;

    let bytes = hex::decode(digits)
        .map_err(|e| Error::InvalidPrivateKey(format!("Invalid hex: {}", e)))?;

    if bytes.len() != 32 {
        return Err(Error::InvalidPrivateKey(format!(
            "Expected 32 bytes, got {}",
            bytes.len()
        )));
    }

    SecretKey::from_slice(&bytes).map_err(|e| Error::InvalidPrivateKey(e.to_string()))
}

/// Syntactic address check: `0x` followed by 40 hex digits, any case
///
/// The EIP-55 checksum is not enforced.
pub fn is_address_syntax_valid(address: &str) -> bool {
    address.len() == ADDRESS_LEN
        && address
            .strip_prefix("0x")
            .map_or(false, |digits| digits.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Parse an address that passed [`is_address_syntax_valid`]
pub fn parse_address(address: &str) -> Result<Address> {
    if !is_address_syntax_valid(address) {
        return Err(Error::InvalidAddress(address.to_string()));
    }

    let bytes = hex::decode(&address[2..])
        .map_err(|e| Error::InvalidAddress(format!("{}: {}", address, e)))?;
    Ok(Address::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1::Secp256k1;

    #[test]
    fn test_public_key_to_address() {
        // Private key 1 maps to the well-known generator address
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        let secret_key = SecretKey::from_slice(&bytes).unwrap();
        let public_key = PublicKey::from_secret_key(&Secp256k1::new(), &secret_key);

        assert_eq!(
            public_key_to_address(&public_key),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
    }

    #[test]
    fn test_private_key_encoding() {
        let encoded = "0x4646464646464646464646464646464646464646464646464646464646464646";
        let secret_key = decode_private_key(encoded).unwrap();
        assert_eq!(encode_private_key(&secret_key), encoded);

        assert!(decode_private_key(&encoded[2..]).is_err());
        assert_eq!(decode_private_key(&encoded.replacen("0x", "0X", 1)).unwrap(), secret_key);
        assert!(decode_private_key("0x46").is_err());
        assert!(decode_private_key("0xzz46464646464646464646464646464646464646464646464646464646464646").is_err());
        // Zero is not a valid scalar
        assert!(decode_private_key(&format!("0x{}", "00".repeat(32))).is_err());
    }

    #[test]
    fn test_address_syntax() {
        assert!(is_address_syntax_valid("0x9858EfFD232B4033E47d90003D41EC34EcaEda94"));
        assert!(is_address_syntax_valid("0x9858effd232b4033e47d90003d41ec34ecaeda94"));

        // odd hex length
        assert!(!is_address_syntax_valid("0x9858EfFD232B4033E47d90003D41EC34EcaEda9"));
        assert!(!is_address_syntax_valid("009858EfFD232B4033E47d90003D41EC34EcaEda94"));
        assert!(!is_address_syntax_valid("0x9858EfFD232B4033E47d90003D41EC34EcaEda94ab"));
        assert!(!is_address_syntax_valid("0xg858EfFD232B4033E47d90003D41EC34EcaEda94"));
        assert!(!is_address_syntax_valid(""));
    }

    #[test]
    fn test_parse_address() {
        let address = parse_address("0x9858effd232b4033e47d90003d41ec34ecaeda94").unwrap();
        assert_eq!(to_checksum(&address, None), "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
        assert!(matches!(parse_address("0x1234"), Err(Error::InvalidAddress(_))));
    }
}
