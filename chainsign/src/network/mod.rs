//! Network registry
//!
//! Per-(coin, network) protocol constants: address version bytes, BIP32
//! extended key headers, WIF byte, bech32 prefix, SLIP-44 coin index and
//! EVM chain id. The table is compiled in and read-only.

mod coin;

pub use coin::*;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Chain family a network belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoinType {
    /// Bitcoin
    Btc,
    /// Litecoin
    Ltc,
    /// Ethereum and ERC-20 tokens
    Eth,
}

impl CoinType {
    /// Ticker code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Btc => "BTC",
            Self::Ltc => "LTC",
            Self::Eth => "ETH",
        }
    }

    /// Human readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Btc => "Bitcoin",
            Self::Ltc => "Litecoin",
            Self::Eth => "Ethereum",
        }
    }

    /// SLIP-44 registered coin index
    pub fn coin_id(&self) -> u32 {
        match self {
            Self::Btc => 0,
            Self::Ltc => 2,
            Self::Eth => 60,
        }
    }

    /// Whether the chain spends UTXOs (as opposed to account balances)
    pub fn is_utxo(&self) -> bool {
        matches!(self, Self::Btc | Self::Ltc)
    }
}

impl fmt::Display for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// BIP32 serialization headers for one network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bip32Headers {
    /// Public header used with legacy (P2PKH) accounts
    pub p2pkh_public: u32,
    /// Private header used with legacy (P2PKH) accounts
    pub p2pkh_private: u32,
    /// Public header used with segwit (P2WPKH) accounts
    pub p2wpkh_public: u32,
    /// Private header used with segwit (P2WPKH) accounts
    pub p2wpkh_private: u32,
}

impl Bip32Headers {
    /// Whether `version` is one of the public headers
    pub fn is_public(&self, version: u32) -> bool {
        version == self.p2pkh_public || version == self.p2wpkh_public
    }

    /// Whether `version` is one of the private headers
    pub fn is_private(&self, version: u32) -> bool {
        version == self.p2pkh_private || version == self.p2wpkh_private
    }
}

/// Protocol constants of a network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
    /// Base58 version byte of P2PKH addresses
    pub pubkey_hash: u8,
    /// Base58 version byte of P2SH addresses
    pub script_hash: u8,
    /// Version byte of WIF encoded private keys
    pub wif: u8,
    /// Human readable part of segwit addresses
    pub bech32_hrp: &'static str,
    /// Extended key headers
    pub bip32: Bip32Headers,
    /// EIP-155 chain id (EVM networks only)
    pub chain_id: Option<u64>,
    /// Maximum amount of money in base units
    pub max_money: u64,
}

const COIN: u64 = 100_000_000;

const BTC_MAINNET: NetworkParams = NetworkParams {
    pubkey_hash: 0x00,
    script_hash: 0x05,
    wif: 0x80,
    bech32_hrp: "bc",
    bip32: Bip32Headers {
        p2pkh_public: 0x0488_b21e,  // xpub
        p2pkh_private: 0x0488_ade4, // xprv
        p2wpkh_public: 0x04b2_4746, // zpub
        p2wpkh_private: 0x04b2_430c, // zprv
    },
    chain_id: None,
    max_money: 21_000_000 * COIN,
};

const BTC_TESTNET: NetworkParams = NetworkParams {
    pubkey_hash: 0x6f,
    script_hash: 0xc4,
    wif: 0xef,
    bech32_hrp: "tb",
    bip32: Bip32Headers {
        p2pkh_public: 0x0435_87cf,  // tpub
        p2pkh_private: 0x0435_8394, // tprv
        p2wpkh_public: 0x045f_1cf6, // vpub
        p2wpkh_private: 0x045f_18bc, // vprv
    },
    chain_id: None,
    max_money: 21_000_000 * COIN,
};

const LTC_MAINNET: NetworkParams = NetworkParams {
    pubkey_hash: 0x30,
    script_hash: 0x32,
    wif: 0xb0,
    bech32_hrp: "ltc",
    bip32: Bip32Headers {
        p2pkh_public: 0x019d_a462,  // Ltub
        p2pkh_private: 0x019d_9cfe, // Ltpv
        // No Litecoin native segwit header is registered; shares zpub/zprv
        p2wpkh_public: 0x04b2_4746,
        p2wpkh_private: 0x04b2_430c,
    },
    chain_id: None,
    max_money: 84_000_000 * COIN,
};

const LTC_TESTNET: NetworkParams = NetworkParams {
    pubkey_hash: 0x6f,
    script_hash: 0x3a,
    wif: 0xef,
    bech32_hrp: "tltc",
    bip32: Bip32Headers {
        p2pkh_public: 0x0436_f6e1,  // ttub
        p2pkh_private: 0x0436_ef7d, // ttpv
        // Shares vpub/vprv with Bitcoin testnet
        p2wpkh_public: 0x045f_1cf6,
        p2wpkh_private: 0x045f_18bc,
    },
    chain_id: None,
    max_money: 84_000_000 * COIN,
};

// Ethereum keys are serialized with the Bitcoin headers; base58 fields are unused.
const ETH_MAINNET: NetworkParams = NetworkParams {
    bip32: Bip32Headers {
        p2pkh_public: 0x0488_b21e,
        p2pkh_private: 0x0488_ade4,
        p2wpkh_public: 0x0488_b21e,
        p2wpkh_private: 0x0488_ade4,
    },
    chain_id: Some(1),
    max_money: u64::MAX,
    ..BTC_MAINNET
};

const ETH_TESTNET: NetworkParams = NetworkParams {
    bip32: Bip32Headers {
        p2pkh_public: 0x0435_87cf,
        p2pkh_private: 0x0435_8394,
        p2wpkh_public: 0x0435_87cf,
        p2wpkh_private: 0x0435_8394,
    },
    chain_id: Some(3),
    max_money: u64::MAX,
    ..BTC_TESTNET
};

/// A (coin, mainnet|testnet) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    BtcMainnet,
    BtcTestnet,
    LtcMainnet,
    LtcTestnet,
    EthMainnet,
    EthTestnet,
}

impl Network {
    /// All supported networks
    pub const ALL: [Network; 6] = [
        Network::BtcMainnet,
        Network::BtcTestnet,
        Network::LtcMainnet,
        Network::LtcTestnet,
        Network::EthMainnet,
        Network::EthTestnet,
    ];

    /// Look up a network by coin type and mainnet flag
    pub fn new(coin_type: CoinType, mainnet: bool) -> Self {
        match (coin_type, mainnet) {
            (CoinType::Btc, true) => Self::BtcMainnet,
            (CoinType::Btc, false) => Self::BtcTestnet,
            (CoinType::Ltc, true) => Self::LtcMainnet,
            (CoinType::Ltc, false) => Self::LtcTestnet,
            (CoinType::Eth, true) => Self::EthMainnet,
            (CoinType::Eth, false) => Self::EthTestnet,
        }
    }

    /// Chain family of this network
    pub fn coin_type(&self) -> CoinType {
        match self {
            Self::BtcMainnet | Self::BtcTestnet => CoinType::Btc,
            Self::LtcMainnet | Self::LtcTestnet => CoinType::Ltc,
            Self::EthMainnet | Self::EthTestnet => CoinType::Eth,
        }
    }

    pub fn is_mainnet(&self) -> bool {
        matches!(self, Self::BtcMainnet | Self::LtcMainnet | Self::EthMainnet)
    }

    /// SLIP-44 coin index of the mainnet coin
    pub fn coin_id(&self) -> u32 {
        self.coin_type().coin_id()
    }

    /// Protocol constants
    pub fn params(&self) -> &'static NetworkParams {
        match self {
            Self::BtcMainnet => &BTC_MAINNET,
            Self::BtcTestnet => &BTC_TESTNET,
            Self::LtcMainnet => &LTC_MAINNET,
            Self::LtcTestnet => &LTC_TESTNET,
            Self::EthMainnet => &ETH_MAINNET,
            Self::EthTestnet => &ETH_TESTNET,
        }
    }

    /// Fail unless this network belongs to `coin_type`
    pub fn require_coin_type(&self, coin_type: CoinType) -> Result<()> {
        if self.coin_type() != coin_type {
            return Err(Error::UnsupportedNetwork(format!(
                "{} network cannot be used for {}",
                self,
                coin_type.name()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_mainnet() { "mainnet" } else { "testnet" };
        write!(f, "{} {}", self.coin_type().name(), kind)
    }
}

/// Address / script type a key is derived and rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressType {
    /// Legacy pay-to-pubkey-hash
    P2pkhLegacy,
    /// Native segwit pay-to-witness-pubkey-hash
    P2wpkhNativeSegwit,
    /// Taproot; rendered and signed as P2WPKH
    P2trTaproot,
    /// Pay-to-script-hash; cannot be HD derived
    P2shPayToScriptHash,
}

impl AddressType {
    /// BIP44 purpose index, `None` when the type is not HD derivable
    pub fn purpose(&self) -> Option<u32> {
        match self {
            Self::P2pkhLegacy => Some(44),
            Self::P2wpkhNativeSegwit => Some(84),
            Self::P2trTaproot => Some(86),
            Self::P2shPayToScriptHash => None,
        }
    }

    /// Whether keys of this type render as witness (bech32) addresses
    pub fn is_segwit(&self) -> bool {
        matches!(self, Self::P2wpkhNativeSegwit | Self::P2trTaproot)
    }

    /// Public BIP32 header used to serialize account keys of this type
    pub fn public_header(&self, network: Network) -> u32 {
        let headers = network.params().bip32;
        if self.is_segwit() {
            headers.p2wpkh_public
        } else {
            headers.p2pkh_public
        }
    }

    /// Private BIP32 header used to serialize account keys of this type
    pub fn private_header(&self, network: Network) -> u32 {
        let headers = network.params().bip32;
        if self.is_segwit() {
            headers.p2wpkh_private
        } else {
            headers.p2pkh_private
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_lookup() {
        for network in Network::ALL {
            assert_eq!(Network::new(network.coin_type(), network.is_mainnet()), network);
        }
    }

    #[test]
    fn test_purposes() {
        assert_eq!(AddressType::P2pkhLegacy.purpose(), Some(44));
        assert_eq!(AddressType::P2wpkhNativeSegwit.purpose(), Some(84));
        assert_eq!(AddressType::P2shPayToScriptHash.purpose(), None);
    }

    #[test]
    fn test_header_selection() {
        let net = Network::BtcMainnet;
        assert_eq!(AddressType::P2pkhLegacy.public_header(net), 0x0488_b21e);
        assert_eq!(AddressType::P2trTaproot.public_header(net), 0x04b2_4746);
        assert_eq!(AddressType::P2wpkhNativeSegwit.private_header(Network::BtcTestnet), 0x045f_18bc);
    }

    #[test]
    fn test_segwit_headers_shared_with_bitcoin() {
        // Only the legacy headers tell Litecoin and Bitcoin keys apart
        let btc = Network::BtcMainnet.params().bip32;
        let ltc = Network::LtcMainnet.params().bip32;
        assert_eq!(btc.p2wpkh_public, ltc.p2wpkh_public);
        assert_ne!(btc.p2pkh_public, ltc.p2pkh_public);
        assert_eq!(
            Network::BtcTestnet.params().bip32.p2wpkh_public,
            Network::LtcTestnet.params().bip32.p2wpkh_public
        );
    }

    #[test]
    fn test_chain_ids() {
        assert_eq!(Network::EthMainnet.params().chain_id, Some(1));
        assert_eq!(Network::EthTestnet.params().chain_id, Some(3));
        assert_eq!(Network::BtcMainnet.params().chain_id, None);
    }

    #[test]
    fn test_require_coin_type() {
        assert!(Network::LtcTestnet.require_coin_type(CoinType::Ltc).is_ok());
        assert!(matches!(
            Network::EthMainnet.require_coin_type(CoinType::Btc),
            Err(Error::UnsupportedNetwork(_))
        ));
    }
}
