//! Input normalization shared by the transaction engines
//!
//! Every check here runs before any lookup or signing. Failures are
//! `InvalidInput` errors naming the offending UTXO, receiver or field.

use std::str::FromStr;

use bitcoin::Txid;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::types::{TransactionReceiver, UtxoReference};
use crate::crypto::keys::bitcoin::{decode_address, decode_wif, DecodedAddress, WifKey};
use crate::error::{Error, Result};
use crate::network::{Coin, Network};

/// A UTXO reference that passed validation
#[derive(Clone)]
pub struct NormalizedUtxo {
    pub tx_hash: String,
    pub txid: Txid,
    pub index: u32,
    pub key: WifKey,
}

/// A receiver that passed validation, with its amount in base units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedReceiver {
    pub address: String,
    pub destination: DecodedAddress,
    pub value: u64,
}

/// Remove every whitespace character
pub fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

pub fn normalize_utxo(network: Network, position: usize, utxo: &UtxoReference) -> Result<NormalizedUtxo> {
    let tx_hash = strip_whitespace(&utxo.tx_hash);
    let invalid = |reason: String| {
        Error::InvalidInput(format!("UTXO #{} ({}:{}): {}", position, tx_hash, utxo.index, reason))
    };

    if tx_hash.is_empty() {
        return Err(invalid("transaction hash is empty".to_string()));
    }
    let txid = Txid::from_str(&tx_hash)
        .map_err(|_| invalid("transaction hash is not a 32-byte hex id".to_string()))?;

    let index = u32::try_from(utxo.index)
        .map_err(|_| invalid("output index must be between 0 and 4294967295".to_string()))?;

    let key = decode_wif(network.params(), &strip_whitespace(&utxo.private_key))
        .map_err(|e| invalid(e.to_string()))?;

    Ok(NormalizedUtxo { tx_hash, txid, index, key })
}

/// Validate a receiver, truncating its amount to the coin's scale
pub fn normalize_receiver(
    network: Network,
    coin: &Coin,
    position: usize,
    receiver: &TransactionReceiver,
) -> Result<NormalizedReceiver> {
    let address = strip_whitespace(&receiver.address);
    let invalid = |reason: String| {
        Error::InvalidInput(format!("Receiver #{} ({}): {}", position, address, reason))
    };

    let destination = decode_address(network.params(), &address).map_err(|e| invalid(e.to_string()))?;

    let amount = receiver
        .amount
        .round_dp_with_strategy(coin.scale, RoundingStrategy::ToZero);
    if amount < coin.min_value {
        return Err(invalid(format!(
            "amount {} is below the {} minimum of {}",
            receiver.amount, coin.code, coin.min_value
        )));
    }

    let max_money = network.params().max_money;
    let value = to_base_units(coin, amount)
        .map_err(|e| invalid(e.to_string()))?;
    let value = u64::try_from(value)
        .ok()
        .filter(|value| *value <= max_money)
        .ok_or_else(|| invalid(format!("amount {} exceeds the {} money supply", amount, coin.code)))?;

    Ok(NormalizedReceiver { address, destination, value })
}

/// Validate an EVM transfer amount, which must already fit the coin's scale
pub fn normalize_evm_amount(coin: &Coin, amount: Decimal) -> Result<Decimal> {
    let amount = amount.normalize();

    if amount.scale() > coin.scale {
        return Err(Error::InvalidInput(format!(
            "Amount {} has {} decimal places, {} allows at most {}",
            amount,
            amount.scale(),
            coin.code,
            coin.scale
        )));
    }

    if amount < coin.min_value {
        return Err(Error::InvalidInput(format!(
            "Amount {} is below the {} minimum of {}",
            amount, coin.code, coin.min_value
        )));
    }

    Ok(amount)
}

/// Convert a whole-coin amount to integer base units
pub fn to_base_units(coin: &Coin, amount: Decimal) -> Result<u128> {
    amount
        .checked_div(coin.min_value)
        .filter(|units| units.fract().is_zero())
        .and_then(|units| units.to_u128())
        .ok_or_else(|| {
            Error::InvalidInput(format!(
                "Amount {} cannot be expressed in {} base units",
                amount, coin.code
            ))
        })
}

/// Validated EVM fee and ordering parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasParams {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
}

pub fn validate_gas_params(nonce: i64, gas_price: i128, gas_limit: i64) -> Result<GasParams> {
    let nonce = u64::try_from(nonce)
        .map_err(|_| Error::InvalidInput(format!("Nonce {} must not be negative", nonce)))?;

    let gas_price = u128::try_from(gas_price)
        .ok()
        .filter(|price| *price > 0)
        .ok_or_else(|| Error::InvalidInput(format!("Gas price {} must be positive", gas_price)))?;

    let gas_limit = u64::try_from(gas_limit)
        .ok()
        .filter(|limit| *limit > 0)
        .ok_or_else(|| Error::InvalidInput(format!("Gas limit {} must be positive", gas_limit)))?;

    Ok(GasParams { nonce, gas_price, gas_limit })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TX_HASH: &str = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";
    const WIF: &str = "KwdMAjGmerYanjeui5SHS7JkmpZvVipYvB2LJGU1ZxJwYvP98617";

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[test]
    fn test_strip_whitespace() {
        assert_eq!(strip_whitespace(" ab c\td\n"), "abcd");
    }

    #[test]
    fn test_normalize_utxo() {
        let spaced = format!(" {} {} ", &TX_HASH[..32], &TX_HASH[32..]);
        let utxo = UtxoReference::new(spaced, 1, WIF);
        let normalized = normalize_utxo(Network::BtcMainnet, 0, &utxo).unwrap();
        assert_eq!(normalized.tx_hash, TX_HASH);
        assert_eq!(normalized.txid.to_string(), TX_HASH);
        assert_eq!(normalized.index, 1);
        assert!(normalized.key.compressed);
    }

    #[test]
    fn test_normalize_utxo_errors() {
        let cases = [
            UtxoReference::new("  ", 0, WIF),
            UtxoReference::new("aabb", 0, WIF),
            UtxoReference::new(TX_HASH, -1, WIF),
            UtxoReference::new(TX_HASH, i64::from(u32::MAX) + 1, WIF),
            UtxoReference::new(TX_HASH, 0, "not a key"),
        ];
        for utxo in &cases {
            assert!(matches!(
                normalize_utxo(Network::BtcMainnet, 3, utxo),
                Err(Error::InvalidInput(message)) if message.starts_with("UTXO #3")
            ));
        }

        // mainnet key on testnet
        assert!(normalize_utxo(Network::BtcTestnet, 0, &UtxoReference::new(TX_HASH, 0, WIF)).is_err());
    }

    #[test]
    fn test_receiver_amount_is_truncated() {
        let receiver = TransactionReceiver::new("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", dec("0.123456789"));
        let normalized = normalize_receiver(Network::BtcMainnet, &Coin::btc(), 0, &receiver).unwrap();
        assert_eq!(normalized.value, 12_345_678);
    }

    #[test]
    fn test_receiver_below_minimum() {
        // truncates to zero
        let receiver = TransactionReceiver::new("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", dec("0.000000009"));
        assert!(matches!(
            normalize_receiver(Network::BtcMainnet, &Coin::btc(), 1, &receiver),
            Err(Error::InvalidInput(message)) if message.starts_with("Receiver #1")
        ));
    }

    #[test]
    fn test_receiver_above_money_supply() {
        let receiver = TransactionReceiver::new("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", dec("21000000.00000001"));
        assert!(normalize_receiver(Network::BtcMainnet, &Coin::btc(), 0, &receiver).is_err());
    }

    #[test]
    fn test_receiver_bad_address() {
        let receiver = TransactionReceiver::new("tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx", dec("1"));
        assert!(normalize_receiver(Network::BtcMainnet, &Coin::btc(), 0, &receiver).is_err());
    }

    #[test]
    fn test_evm_amount_requires_exact_scale() {
        let coin = Coin::wbtc();
        assert_eq!(normalize_evm_amount(&coin, dec("1.23")).unwrap(), dec("1.23"));
        assert_eq!(normalize_evm_amount(&coin, dec("1.2300000000")).unwrap(), dec("1.23"));
        assert!(normalize_evm_amount(&coin, dec("1.234567891")).is_err());
        assert!(normalize_evm_amount(&coin, dec("0")).is_err());
    }

    #[test]
    fn test_to_base_units() {
        assert_eq!(to_base_units(&Coin::btc(), dec("1.5")).unwrap(), 150_000_000);
        assert_eq!(to_base_units(&Coin::usdt(), dec("12.34")).unwrap(), 12_340_000);
        assert_eq!(to_base_units(&Coin::eth(), dec("1")).unwrap(), 1_000_000_000_000_000_000);
        assert!(to_base_units(&Coin::usdt(), dec("0.0000001")).is_err());
    }

    #[test]
    fn test_gas_params() {
        assert!(validate_gas_params(0, 1, 21_000).is_ok());
        assert!(validate_gas_params(-1, 1, 21_000).is_err());
        assert!(validate_gas_params(0, 0, 21_000).is_err());
        assert!(validate_gas_params(0, 1, 0).is_err());
        assert!(validate_gas_params(0, -5, 21_000).is_err());
    }
}
