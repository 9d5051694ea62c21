//! BIP32 extended keys
//!
//! A node holds either a private scalar or only the public point, plus the
//! chain code and position metadata. Public nodes can derive non-hardened
//! children; hardened children require the private scalar.

use std::fmt;

use hmac::{Hmac, Mac};
use secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey};
use sha2::Sha512;

use super::derivation::{ChildNumber, DerivationPath};
use crate::crypto::encoding::{base58check_decode, base58check_encode, hash160};
use crate::error::{Error, Result};
use crate::network::Network;

/// Length of a serialized extended key before the checksum
const SERIALIZED_LEN: usize = 78;

/// Key material of a node
#[derive(Clone, PartialEq, Eq)]
pub enum KeyMaterial {
    Private(SecretKey),
    Public(PublicKey),
}

/// A node of the BIP32 key tree
#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedKey {
    key: KeyMaterial,
    chain_code: [u8; 32],
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_number: ChildNumber,
}

// Never print the private scalar
impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKey")
            .field("public_only", &self.is_public_only())
            .field("depth", &self.depth)
            .field("parent_fingerprint", &hex::encode(self.parent_fingerprint))
            .field("child_number", &self.child_number)
            .finish_non_exhaustive()
    }
}

fn hmac_sha512(key: &[u8], data: &[u8]) -> Result<([u8; 32], [u8; 32])> {
    let mut hmac = Hmac::<Sha512>::new_from_slice(key)
        .map_err(|_| Error::KeyDerivation("HMAC error".to_string()))?;

    hmac.update(data);
    let result = hmac.finalize().into_bytes();

    let mut left = [0u8; 32];
    let mut right = [0u8; 32];
    left.copy_from_slice(&result[0..32]);
    right.copy_from_slice(&result[32..64]);

    Ok((left, right))
}

impl ExtendedKey {
    /// Derive the master node from a seed
    pub fn new_master(seed: &[u8]) -> Result<Self> {
        let (secret_key, chain_code) = hmac_sha512(b"Bitcoin seed", seed)?;
        let secret_key = SecretKey::from_slice(&secret_key)
            .map_err(|e| Error::KeyDerivation(format!("Invalid master key: {}", e)))?;

        Ok(Self {
            key: KeyMaterial::Private(secret_key),
            chain_code,
            depth: 0,
            parent_fingerprint: [0u8; 4],
            child_number: ChildNumber::Normal(0),
        })
    }

    pub fn is_public_only(&self) -> bool {
        matches!(self.key, KeyMaterial::Public(_))
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.parent_fingerprint
    }

    pub fn child_number(&self) -> ChildNumber {
        self.child_number
    }

    /// The private scalar, `None` for public-only nodes
    pub fn secret_key(&self) -> Option<&SecretKey> {
        match &self.key {
            KeyMaterial::Private(secret_key) => Some(secret_key),
            KeyMaterial::Public(_) => None,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match &self.key {
            KeyMaterial::Private(secret_key) => PublicKey::from_secret_key(&Secp256k1::new(), secret_key),
            KeyMaterial::Public(public_key) => *public_key,
        }
    }

    /// First four bytes of HASH160 of the compressed public key
    pub fn fingerprint(&self) -> [u8; 4] {
        let hash = hash160(&self.public_key().serialize());
        let mut fingerprint = [0u8; 4];
        fingerprint.copy_from_slice(&hash[0..4]);
        fingerprint
    }

    /// Drop the private scalar
    pub fn to_public(&self) -> Self {
        Self {
            key: KeyMaterial::Public(self.public_key()),
            ..self.clone()
        }
    }

    /// Derive a direct child
    pub fn derive_child(&self, child: ChildNumber) -> Result<Self> {
        if self.depth == u8::MAX {
            return Err(Error::KeyDerivation("Maximum derivation depth reached".to_string()));
        }
        if !child.is_in_range() {
            return Err(Error::KeyDerivation(format!(
                "Child index {} is out of range",
                child.index()
            )));
        }

        let index = child.to_u32();
        let mut data = Vec::with_capacity(37);

        match (&self.key, child.is_hardened()) {
            (KeyMaterial::Private(secret_key), true) => {
                data.push(0);
                data.extend_from_slice(&secret_key.secret_bytes());
            }
            (KeyMaterial::Public(_), true) => {
                return Err(Error::KeyDerivation(format!(
                    "Cannot derive hardened child {} from a public key",
                    child
                )));
            }
            (_, false) => data.extend_from_slice(&self.public_key().serialize()),
        }
        data.extend_from_slice(&index.to_be_bytes());

        let (tweak, chain_code) = hmac_sha512(&self.chain_code, &data)?;
        let tweak = Scalar::from_be_bytes(tweak)
            .map_err(|_| Error::KeyDerivation(format!("Invalid child key at index {}", child)))?;

        let key = match &self.key {
            KeyMaterial::Private(secret_key) => KeyMaterial::Private(
                secret_key
                    .add_tweak(&tweak)
                    .map_err(|e| Error::KeyDerivation(format!("Key addition error: {}", e)))?,
            ),
            KeyMaterial::Public(public_key) => KeyMaterial::Public(
                public_key
                    .add_exp_tweak(&Secp256k1::new(), &tweak)
                    .map_err(|e| Error::KeyDerivation(format!("Point addition error: {}", e)))?,
            ),
        };

        Ok(Self {
            key,
            chain_code,
            depth: self.depth + 1,
            parent_fingerprint: self.fingerprint(),
            child_number: child,
        })
    }

    /// Derive every segment of `path` in turn
    pub fn derive_path(&self, path: &DerivationPath) -> Result<Self> {
        path.segments()
            .iter()
            .try_fold(self.clone(), |node, child| node.derive_child(*child))
    }

    /// Serialize with the given 4-byte version header as Base58Check
    pub fn serialize(&self, version: u32) -> String {
        let mut data = Vec::with_capacity(SERIALIZED_LEN);
        data.extend_from_slice(&version.to_be_bytes());
        data.push(self.depth);
        data.extend_from_slice(&self.parent_fingerprint);
        data.extend_from_slice(&self.child_number.to_u32().to_be_bytes());
        data.extend_from_slice(&self.chain_code);
        match &self.key {
            KeyMaterial::Private(secret_key) => {
                data.push(0);
                data.extend_from_slice(&secret_key.secret_bytes());
            }
            KeyMaterial::Public(public_key) => data.extend_from_slice(&public_key.serialize()),
        }
        base58check_encode(&data)
    }

    /// Decode an extended key string whose header belongs to `network`
    ///
    /// Both public and private keys decode; callers that need an xpub check
    /// [`ExtendedKey::is_public_only`].
    pub fn decode(network: Network, encoded: &str) -> Result<Self> {
        let data = base58check_decode(encoded)
            .map_err(|e| Error::InvalidExtendedKey(e.to_string()))?;

        if data.len() != SERIALIZED_LEN {
            return Err(Error::InvalidExtendedKey(format!(
                "Expected {} bytes, got {}",
                SERIALIZED_LEN,
                data.len()
            )));
        }

        let mut version = [0u8; 4];
        version.copy_from_slice(&data[0..4]);
        let version = u32::from_be_bytes(version);
        let headers = network.params().bip32;

        let mut parent_fingerprint = [0u8; 4];
        parent_fingerprint.copy_from_slice(&data[5..9]);
        let mut child_number = [0u8; 4];
        child_number.copy_from_slice(&data[9..13]);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&data[13..45]);

        let key = if headers.is_private(version) {
            if data[45] != 0 {
                return Err(Error::InvalidExtendedKey("Malformed private key data".to_string()));
            }
            KeyMaterial::Private(
                SecretKey::from_slice(&data[46..78])
                    .map_err(|e| Error::InvalidExtendedKey(e.to_string()))?,
            )
        } else if headers.is_public(version) {
            KeyMaterial::Public(
                PublicKey::from_slice(&data[45..78])
                    .map_err(|e| Error::InvalidExtendedKey(e.to_string()))?,
            )
        } else {
            return Err(Error::InvalidExtendedKey(format!(
                "Version {:08x} does not belong to {}",
                version, network
            )));
        };

        Ok(Self {
            key,
            chain_code,
            depth: data[4],
            parent_fingerprint,
            child_number: ChildNumber::from(u32::from_be_bytes(child_number)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // BIP32 test vector 1
    const SEED: &str = "000102030405060708090a0b0c0d0e0f";
    const XPUB: u32 = 0x0488_b21e;
    const XPRV: u32 = 0x0488_ade4;

    fn master() -> ExtendedKey {
        ExtendedKey::new_master(&hex::decode(SEED).unwrap()).unwrap()
    }

    #[test]
    fn test_master_key() {
        let master = master();
        assert_eq!(
            master.serialize(XPRV),
            "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi"
        );
        assert_eq!(
            master.to_public().serialize(XPUB),
            "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8"
        );
    }

    #[test]
    fn test_hardened_then_normal() {
        let path: DerivationPath = "m/0'/1".parse().unwrap();
        let node = master().derive_path(&path).unwrap();
        assert_eq!(node.depth(), 2);
        assert_eq!(
            node.to_public().serialize(XPUB),
            "xpub6ASuArnXKPbfEwhqN6e3mwBcDTgzisQN1wXN9BJcM47sSikHjJf3UFHKkNAWbWMiGj7Wf5uMash7SyYq527Hqck2AxYysAA7xmALppuCkwQ"
        );
    }

    #[test]
    fn test_public_derivation_matches_private() {
        let account = master().derive_child(ChildNumber::Hardened(0)).unwrap();
        let from_private = account.derive_child(ChildNumber::Normal(1)).unwrap();
        let from_public = account.to_public().derive_child(ChildNumber::Normal(1)).unwrap();

        assert_eq!(from_private.public_key(), from_public.public_key());
        assert_eq!(from_private.chain_code(), from_public.chain_code());
        assert_eq!(from_private.to_public(), from_public);
    }

    #[test]
    fn test_hardened_from_public_fails() {
        let public = master().to_public();
        assert!(matches!(
            public.derive_child(ChildNumber::Hardened(0)),
            Err(Error::KeyDerivation(_))
        ));
    }

    #[test]
    fn test_out_of_range_child_fails() {
        let master = master();
        assert!(matches!(
            master.derive_child(ChildNumber::Hardened(0x8000_0001)),
            Err(Error::KeyDerivation(_))
        ));
        assert!(matches!(
            master.to_public().derive_child(ChildNumber::Normal(0x8000_0001)),
            Err(Error::KeyDerivation(_))
        ));
        assert!(master.derive_child(ChildNumber::Hardened(0x7fff_ffff)).is_ok());
    }

    #[test]
    fn test_decode_round_trip() {
        let node = master().derive_child(ChildNumber::Hardened(0)).unwrap();

        let xprv = node.serialize(XPRV);
        let decoded = ExtendedKey::decode(Network::BtcMainnet, &xprv).unwrap();
        assert!(!decoded.is_public_only());
        assert_eq!(decoded, node);

        let xpub = node.to_public().serialize(XPUB);
        let decoded = ExtendedKey::decode(Network::BtcMainnet, &xpub).unwrap();
        assert!(decoded.is_public_only());
        assert_eq!(decoded, node.to_public());
    }

    #[test]
    fn test_decode_rejects_foreign_header() {
        let xpub = master().to_public().serialize(XPUB);
        assert!(matches!(
            ExtendedKey::decode(Network::BtcTestnet, &xpub),
            Err(Error::InvalidExtendedKey(_))
        ));
        assert!(ExtendedKey::decode(Network::BtcMainnet, "xpub123").is_err());
    }
}
