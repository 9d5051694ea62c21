//! Address, extended public key and private key generation
//!
//! Everything here starts from a mnemonic or an xpub and renders strings in
//! the encoding of the target network.

use secp256k1::{PublicKey, Secp256k1, SecretKey};
use tracing::debug;

use crate::crypto::keys::{self, bitcoin as btc, ethereum as eth, ChildNumber, ExtendedKey};
use crate::crypto::mnemonic::{is_mnemonic_valid, mnemonic_to_seed};
use crate::error::{Error, Result};
use crate::network::{AddressType, CoinType, Network};

/// ETH only has one address shape
fn check_address_type(network: Network, address_type: AddressType) -> Result<()> {
    if network.coin_type() == CoinType::Eth && address_type != AddressType::P2pkhLegacy {
        return Err(Error::UnsupportedAddressType(format!(
            "{:?} is not applicable to {}, use P2pkhLegacy",
            address_type, network
        )));
    }
    Ok(())
}

fn account_node(network: Network, address_type: AddressType, mnemonic: &str) -> Result<ExtendedKey> {
    check_address_type(network, address_type)?;

    if !is_mnemonic_valid(mnemonic) {
        return Err(Error::InvalidMnemonic("Mnemonic failed validation".to_string()));
    }

    let path = keys::derive_path(address_type, network)?;
    debug!(%network, %path, "Deriving account node");

    let seed = mnemonic_to_seed(mnemonic, None)?;
    ExtendedKey::new_master(&seed)?.derive_path(&path)
}

/// Render the receive address of a public key
fn render_address(network: Network, address_type: AddressType, public_key: &PublicKey) -> Result<String> {
    let params = network.params();
    match (network.coin_type(), address_type) {
        (CoinType::Eth, _) => Ok(eth::public_key_to_address(public_key)),
        (_, AddressType::P2pkhLegacy) => Ok(btc::p2pkh_address(params, &public_key.serialize())),
        // Taproot is rendered as P2WPKH
        (_, AddressType::P2wpkhNativeSegwit | AddressType::P2trTaproot) => {
            btc::p2wpkh_address(params, public_key)
        }
        (_, AddressType::P2shPayToScriptHash) => Err(Error::UnsupportedAddressType(
            "P2SH addresses cannot be derived from a single key".to_string(),
        )),
    }
}

fn render_private_key(network: Network, secret_key: &SecretKey) -> String {
    match network.coin_type() {
        CoinType::Eth => eth::encode_private_key(secret_key),
        CoinType::Btc | CoinType::Ltc => btc::encode_wif(network.params(), secret_key, true),
    }
}

/// Generate the account-level extended public key for a mnemonic
///
/// The key sits at `m/purpose'/coin'/0'/0` and is serialized with the
/// network's header for the address type.
pub fn generate_extended_public_key(
    network: Network,
    address_type: AddressType,
    mnemonic: &str,
) -> Result<String> {
    let node = account_node(network, address_type, mnemonic)?;
    let xpub = node.to_public().serialize(address_type.public_header(network));

    if !is_extended_public_key_valid(network, &xpub) {
        return Err(Error::InternalValidationFailure(
            "Generated extended public key failed validation".to_string(),
        ));
    }

    Ok(xpub)
}

/// Whether `xpub` decodes under the network and carries no private key
pub fn is_extended_public_key_valid(network: Network, xpub: &str) -> bool {
    ExtendedKey::decode(network, xpub)
        .map(|key| key.is_public_only())
        .unwrap_or(false)
}

/// Derive the receive address at `index` below an account xpub
pub fn generate_address(
    network: Network,
    address_type: AddressType,
    xpub: &str,
    index: u32,
) -> Result<String> {
    check_address_type(network, address_type)?;

    let node = ExtendedKey::decode(network, xpub)?;
    if !node.is_public_only() {
        return Err(Error::InvalidExtendedKey(
            "Expected an extended public key".to_string(),
        ));
    }

    let child = node.derive_child(ChildNumber::normal(index)?)?;
    render_address(network, address_type, &child.public_key())
}

/// Derive the private key for the address at `index`
pub fn generate_private_key(
    network: Network,
    address_type: AddressType,
    mnemonic: &str,
    index: u32,
) -> Result<String> {
    let node = account_node(network, address_type, mnemonic)?
        .derive_child(ChildNumber::normal(index)?)?;

    let secret_key = node.secret_key().ok_or_else(|| {
        Error::InternalValidationFailure("Derived node has no private key".to_string())
    })?;

    Ok(render_private_key(network, secret_key))
}

/// Render the receive address controlled by an encoded private key
pub fn address_from_private_key(
    network: Network,
    address_type: AddressType,
    private_key: &str,
) -> Result<String> {
    check_address_type(network, address_type)?;

    match network.coin_type() {
        CoinType::Eth => {
            let secret_key = eth::decode_private_key(private_key)?;
            let public_key = PublicKey::from_secret_key(&Secp256k1::new(), &secret_key);
            Ok(eth::public_key_to_address(&public_key))
        }
        CoinType::Btc | CoinType::Ltc => {
            let wif = btc::decode_wif(network.params(), private_key)?;
            if address_type == AddressType::P2pkhLegacy {
                return Ok(btc::p2pkh_address(network.params(), &wif.public_key_bytes()));
            }
            if !wif.compressed {
                return Err(Error::InvalidPrivateKey(
                    "Witness addresses require a compressed key".to_string(),
                ));
            }
            let public_key = PublicKey::from_secret_key(&Secp256k1::new(), &wif.secret_key);
            render_address(network, address_type, &public_key)
        }
    }
}

/// Whether `address` is well formed for the network
///
/// ETH addresses are checked syntactically only.
pub fn is_address_valid(network: Network, address: &str) -> bool {
    match network.coin_type() {
        CoinType::Eth => eth::is_address_syntax_valid(address),
        CoinType::Btc | CoinType::Ltc => btc::decode_address(network.params(), address).is_ok(),
    }
}

/// Whether `key` decodes as a private key for the network
pub fn is_private_key_valid(network: Network, key: &str) -> bool {
    match network.coin_type() {
        CoinType::Eth => eth::decode_private_key(key).is_ok(),
        CoinType::Btc | CoinType::Ltc => btc::decode_wif(network.params(), key).is_ok(),
    }
}
