//! Tests for key derivation

use chainsign::crypto::keys::*;
use chainsign::crypto::mnemonic::*;
use chainsign::network::{AddressType, Network};
use chainsign::*;

const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn address_at(network: Network, address_type: AddressType, index: u32) -> String {
    let xpub = generate_extended_public_key(network, address_type, MNEMONIC).unwrap();
    generate_address(network, address_type, &xpub, index).unwrap()
}

#[test]
fn test_bitcoin_legacy_derivation() {
    let address = address_at(Network::BtcMainnet, AddressType::P2pkhLegacy, 0);
    assert_eq!(address, "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA");

    let private_key = generate_private_key(Network::BtcMainnet, AddressType::P2pkhLegacy, MNEMONIC, 0).unwrap();
    assert_eq!(private_key, "L4p2b9VAf8k5aUahF1JCJUzZkgNEAqLfq8DDdQiyAprQAKSbu8hf");
}

#[test]
fn test_bitcoin_segwit_derivation() {
    let address = address_at(Network::BtcMainnet, AddressType::P2wpkhNativeSegwit, 0);
    assert_eq!(address, "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu");

    let private_key =
        generate_private_key(Network::BtcMainnet, AddressType::P2wpkhNativeSegwit, MNEMONIC, 0).unwrap();
    assert_eq!(private_key, "KyZpNDKnfs94vbrwhJneDi77V6jF64PWPF8x5cdJb8ifgg2DUc9d");
}

#[test]
fn test_ethereum_derivation() {
    let address = address_at(Network::EthMainnet, AddressType::P2pkhLegacy, 0);
    assert_eq!(address, "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");

    let private_key = generate_private_key(Network::EthMainnet, AddressType::P2pkhLegacy, MNEMONIC, 0).unwrap();
    assert_eq!(
        private_key,
        "0x1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727"
    );
}

#[test]
fn test_extended_public_key_headers() {
    let cases = [
        (Network::BtcMainnet, AddressType::P2pkhLegacy, "xpub"),
        (Network::BtcMainnet, AddressType::P2wpkhNativeSegwit, "zpub"),
        (Network::BtcTestnet, AddressType::P2pkhLegacy, "tpub"),
        (Network::BtcTestnet, AddressType::P2wpkhNativeSegwit, "vpub"),
        (Network::LtcMainnet, AddressType::P2pkhLegacy, "Ltub"),
        (Network::EthMainnet, AddressType::P2pkhLegacy, "xpub"),
    ];

    for (network, address_type, prefix) in cases {
        let xpub = generate_extended_public_key(network, address_type, MNEMONIC).unwrap();
        assert!(xpub.starts_with(prefix), "{} {:?}: {}", network, address_type, xpub);
        assert!(is_extended_public_key_valid(network, &xpub));

        let decoded = ExtendedKey::decode(network, &xpub).unwrap();
        assert!(decoded.is_public_only());
        assert_eq!(decoded.depth(), 4);
    }
}

#[test]
fn test_xpub_does_not_cross_networks() {
    let xpub = generate_extended_public_key(Network::BtcMainnet, AddressType::P2pkhLegacy, MNEMONIC).unwrap();
    assert!(!is_extended_public_key_valid(Network::BtcTestnet, &xpub));
    assert!(!is_extended_public_key_valid(Network::LtcMainnet, &xpub));
}

#[test]
fn test_xpub_derivation_matches_mnemonic_derivation() {
    for network in Network::ALL {
        let address_types: &[AddressType] = if network.coin_type() == CoinType::Eth {
            &[AddressType::P2pkhLegacy]
        } else {
            &[AddressType::P2pkhLegacy, AddressType::P2wpkhNativeSegwit, AddressType::P2trTaproot]
        };

        for &address_type in address_types {
            for index in [0, 1, 7] {
                let from_xpub = address_at(network, address_type, index);
                let private_key = generate_private_key(network, address_type, MNEMONIC, index).unwrap();
                let from_private_key = address_from_private_key(network, address_type, &private_key).unwrap();

                assert_eq!(from_xpub, from_private_key, "{} {:?} #{}", network, address_type, index);
                assert!(is_address_valid(network, &from_xpub));
                assert!(is_private_key_valid(network, &private_key));
            }
        }
    }
}

#[test]
fn test_derivation_is_deterministic() {
    for network in [Network::BtcTestnet, Network::LtcMainnet, Network::EthTestnet] {
        let first = generate_private_key(network, AddressType::P2pkhLegacy, MNEMONIC, 3).unwrap();
        let second = generate_private_key(network, AddressType::P2pkhLegacy, MNEMONIC, 3).unwrap();
        assert_eq!(first, second);

        assert_eq!(
            address_at(network, AddressType::P2pkhLegacy, 3),
            address_at(network, AddressType::P2pkhLegacy, 3)
        );
    }
}

#[test]
fn test_address_shapes() {
    assert!(address_at(Network::BtcTestnet, AddressType::P2wpkhNativeSegwit, 0).starts_with("tb1q"));
    assert!(address_at(Network::LtcMainnet, AddressType::P2wpkhNativeSegwit, 0).starts_with("ltc1q"));
    assert!(address_at(Network::LtcTestnet, AddressType::P2wpkhNativeSegwit, 0).starts_with("tltc1q"));
    assert!(address_at(Network::LtcMainnet, AddressType::P2pkhLegacy, 0).starts_with('L'));

    let testnet = address_at(Network::BtcTestnet, AddressType::P2pkhLegacy, 0);
    assert!(testnet.starts_with('m') || testnet.starts_with('n'));

    // Taproot keeps the P2WPKH rendering, under its own purpose
    let taproot = address_at(Network::BtcMainnet, AddressType::P2trTaproot, 0);
    assert!(taproot.starts_with("bc1q"));
    assert_ne!(taproot, address_at(Network::BtcMainnet, AddressType::P2wpkhNativeSegwit, 0));
}

#[test]
fn test_path_building() {
    let seed = mnemonic_to_seed(MNEMONIC, None).unwrap();
    let path = derive_path(AddressType::P2wpkhNativeSegwit, Network::BtcMainnet)
        .unwrap()
        .extend(ChildNumber::normal(0).unwrap());
    assert_eq!(path.to_string(), "m/84'/0'/0'/0/0");

    let node = ExtendedKey::new_master(&seed).unwrap().derive_path(&path).unwrap();
    assert_eq!(
        address_from_private_key(
            Network::BtcMainnet,
            AddressType::P2wpkhNativeSegwit,
            &chainsign::crypto::keys::bitcoin::encode_wif(Network::BtcMainnet.params(), node.secret_key().unwrap(), true),
        )
        .unwrap(),
        "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu"
    );
}

#[test]
fn test_address_validation() {
    assert!(is_address_valid(Network::EthMainnet, "0x9858EfFD232B4033E47d90003D41EC34EcaEda94"));
    assert!(!is_address_valid(Network::EthMainnet, "0x9858EfFD232B4033E47d90003D41EC34EcaEda9"));
    assert!(!is_address_valid(Network::EthMainnet, "9858EfFD232B4033E47d90003D41EC34EcaEda94"));

    assert!(is_address_valid(Network::BtcMainnet, "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA"));
    assert!(is_address_valid(Network::BtcMainnet, "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu"));
    assert!(!is_address_valid(Network::BtcTestnet, "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA"));
    assert!(!is_address_valid(Network::LtcMainnet, "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu"));
}

#[test]
fn test_private_key_validation() {
    assert!(is_private_key_valid(Network::BtcMainnet, "L4p2b9VAf8k5aUahF1JCJUzZkgNEAqLfq8DDdQiyAprQAKSbu8hf"));
    assert!(!is_private_key_valid(Network::BtcTestnet, "L4p2b9VAf8k5aUahF1JCJUzZkgNEAqLfq8DDdQiyAprQAKSbu8hf"));
    assert!(!is_private_key_valid(Network::LtcMainnet, "L4p2b9VAf8k5aUahF1JCJUzZkgNEAqLfq8DDdQiyAprQAKSbu8hf"));

    assert!(is_private_key_valid(
        Network::EthMainnet,
        "0x1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727"
    ));
    assert!(!is_private_key_valid(
        Network::EthMainnet,
        "1ab42cc412b618bdea3a599e3c9bae199ebf030895b039e9db1e30dafb12b727"
    ));
}

#[test]
fn test_generated_mnemonic_derives() {
    let mnemonic = generate_mnemonic(24).unwrap();
    let xpub = generate_extended_public_key(Network::LtcTestnet, AddressType::P2wpkhNativeSegwit, &mnemonic).unwrap();
    assert!(is_extended_public_key_valid(Network::LtcTestnet, &xpub));
}
