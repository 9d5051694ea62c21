//! Mnemonic phrase generation and handling

use bip39::Mnemonic;
use rand::{rngs::OsRng, RngCore};
use crate::error::{Error, Result};

/// Fewest words a generated phrase may have
pub const MIN_WORDS: usize = 12;
/// Most words a generated phrase may have
pub const MAX_WORDS: usize = 24;

/// Entropy bits behind a phrase of `length` words (each word carries 11 bits,
/// one bit in every 33 is checksum)
fn entropy_bits(length: usize) -> usize {
    length * 11 - length / 3
}

/// Generate a new random mnemonic phrase of `length` words
///
/// `length` must be between 12 and 24 and a multiple of 3.
pub fn generate_mnemonic(length: usize) -> Result<String> {
    if !(MIN_WORDS..=MAX_WORDS).contains(&length) || length % 3 != 0 {
        return Err(Error::InvalidParameter(format!(
            "Invalid word length {}: it must be between {} and {}, and a multiple of 3",
            length, MIN_WORDS, MAX_WORDS
        )));
    }

    let mut entropy = vec![0u8; entropy_bits(length) / 8];
    OsRng.fill_bytes(&mut entropy);

    let mnemonic = Mnemonic::from_entropy(&entropy)
        .map_err(|e| Error::InvalidParameter(e.to_string()))?;
    let phrase = mnemonic.to_string();

    if mnemonic.word_count() != length || !is_mnemonic_valid(&phrase) {
        return Err(Error::InternalValidationFailure(
            "Generated mnemonic failed validation".to_string(),
        ));
    }

    Ok(phrase)
}

/// Validate a mnemonic phrase: wordlist membership and checksum
pub fn is_mnemonic_valid(phrase: &str) -> bool {
    Mnemonic::parse_normalized(phrase).is_ok()
}

/// Generate a seed from a mnemonic phrase and optional passphrase
pub fn mnemonic_to_seed(phrase: &str, passphrase: Option<&str>) -> Result<Vec<u8>> {
    let mnemonic = Mnemonic::parse_normalized(phrase)
        .map_err(|e| Error::InvalidMnemonic(e.to_string()))?;

    let seed = mnemonic.to_seed(passphrase.unwrap_or(""));
    Ok(seed.to_vec())
}
