//! Bitcoin and Litecoin address and private key encoding

use bech32::{segwit, Hrp};
use bitcoin::hashes::Hash;
use bitcoin::{PubkeyHash, ScriptBuf, ScriptHash};
use secp256k1::{PublicKey, Secp256k1, SecretKey};

use crate::crypto::encoding::{base58check_decode, base58check_encode, hash160};
use crate::error::{Error, Result};
use crate::network::NetworkParams;

/// A decoded WIF private key
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct WifKey {
    pub secret_key: SecretKey,
    /// Whether the matching public key is serialized compressed
    pub compressed: bool,
}

impl WifKey {
    /// Public key bytes in the encoding the WIF flag selects
    pub fn public_key_bytes(&self) -> Vec<u8> {
        let public_key = PublicKey::from_secret_key(&Secp256k1::new(), &self.secret_key);
        if self.compressed {
            public_key.serialize().to_vec()
        } else {
            public_key.serialize_uncompressed().to_vec()
        }
    }
}

/// Encode a private key in Wallet Import Format
pub fn encode_wif(params: &NetworkParams, secret_key: &SecretKey, compressed: bool) -> String {
    let mut data = Vec::with_capacity(34);
    data.push(params.wif);
    data.extend_from_slice(&secret_key.secret_bytes());
    if compressed {
        data.push(0x01);
    }
    base58check_encode(&data)
}

/// Decode a Wallet Import Format private key for the given network
pub fn decode_wif(params: &NetworkParams, encoded: &str) -> Result<WifKey> {
    let data = base58check_decode(encoded)
        .map_err(|e| Error::InvalidPrivateKey(e.to_string()))?;

    let compressed = match data.len() {
        33 => false,
        34 if data[33] == 0x01 => true,
        _ => return Err(Error::InvalidPrivateKey("Invalid WIF length".to_string())),
    };

    if data[0] != params.wif {
        return Err(Error::InvalidPrivateKey(format!(
            "WIF version {:#04x} does not match network",
            data[0]
        )));
    }

    let secret_key = SecretKey::from_slice(&data[1..33])
        .map_err(|e| Error::InvalidPrivateKey(e.to_string()))?;

    Ok(WifKey { secret_key, compressed })
}

/// Base58Check P2PKH address of a serialized public key
pub fn p2pkh_address(params: &NetworkParams, public_key: &[u8]) -> String {
    let mut data = Vec::with_capacity(21);
    data.push(params.pubkey_hash);
    data.extend_from_slice(&hash160(public_key));
    base58check_encode(&data)
}

/// Bech32 P2WPKH address of a compressed public key
pub fn p2wpkh_address(params: &NetworkParams, public_key: &PublicKey) -> Result<String> {
    let hrp = Hrp::parse(params.bech32_hrp)
        .map_err(|e| Error::InvalidAddress(format!("Invalid bech32 prefix: {}", e)))?;

    segwit::encode_v0(hrp, &hash160(&public_key.serialize()))
        .map_err(|e| Error::InvalidAddress(format!("Bech32 encoding failed: {}", e)))
}

/// A decoded BTC/LTC address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedAddress {
    P2pkh([u8; 20]),
    P2sh([u8; 20]),
    /// Segwit output of any version (v0 P2WPKH/P2WSH, v1 taproot, ...)
    Witness { version: u8, program: Vec<u8> },
}

impl DecodedAddress {
    /// The locking script paying to this address
    pub fn script_pubkey(&self) -> ScriptBuf {
        match self {
            Self::P2pkh(hash) => ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(*hash)),
            Self::P2sh(hash) => ScriptBuf::new_p2sh(&ScriptHash::from_byte_array(*hash)),
            Self::Witness { version, program } => {
                // OP_0 or OP_1..OP_16, then a direct push of the program
                let version_opcode = if *version == 0 { 0x00 } else { 0x50 + version };
                let mut script = Vec::with_capacity(program.len() + 2);
                script.push(version_opcode);
                script.push(program.len() as u8);
                script.extend_from_slice(program);
                ScriptBuf::from_bytes(script)
            }
        }
    }
}

/// Decode an address string under the network's version bytes and prefix
pub fn decode_address(params: &NetworkParams, address: &str) -> Result<DecodedAddress> {
    if let Ok((hrp, version, program)) = segwit::decode(address) {
        if !hrp.to_string().eq_ignore_ascii_case(params.bech32_hrp) {
            return Err(Error::InvalidAddress(format!(
                "Address prefix {} does not match network",
                hrp
            )));
        }
        return Ok(DecodedAddress::Witness {
            version: version.to_u8(),
            program,
        });
    }

    let data = base58check_decode(address)
        .map_err(|e| Error::InvalidAddress(format!("{}: {}", address, e)))?;

    if data.len() != 21 {
        return Err(Error::InvalidAddress(format!("{}: invalid payload length", address)));
    }

    let mut hash = [0u8; 20];
    hash.copy_from_slice(&data[1..21]);

    if data[0] == params.pubkey_hash {
        Ok(DecodedAddress::P2pkh(hash))
    } else if data[0] == params.script_hash {
        Ok(DecodedAddress::P2sh(hash))
    } else {
        Err(Error::InvalidAddress(format!(
            "{}: version byte {:#04x} does not match network",
            address, data[0]
        )))
    }
}
