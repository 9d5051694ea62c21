//! BIP32 derivation paths

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::network::{AddressType, Network};

/// First index of the hardened range (2^31)
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// One segment of a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildNumber {
    /// Non-hardened child, index below 2^31
    Normal(u32),
    /// Hardened child, index below 2^31; encoded as index + 2^31
    Hardened(u32),
}

impl ChildNumber {
    /// Non-hardened child number
    pub fn normal(index: u32) -> Result<Self> {
        if index >= HARDENED_OFFSET {
            return Err(Error::InvalidParameter(format!(
                "Child index {} is out of the non-hardened range",
                index
            )));
        }
        Ok(Self::Normal(index))
    }

    /// Hardened child number
    pub fn hardened(index: u32) -> Result<Self> {
        if index >= HARDENED_OFFSET {
            return Err(Error::InvalidParameter(format!(
                "Child index {} is out of the hardened range",
                index
            )));
        }
        Ok(Self::Hardened(index))
    }

    pub fn is_hardened(&self) -> bool {
        matches!(self, Self::Hardened(_))
    }

    /// Index within the normal or hardened range
    pub fn index(&self) -> u32 {
        match *self {
            Self::Normal(index) | Self::Hardened(index) => index,
        }
    }

    /// Whether the index is below 2^31
    pub fn is_in_range(&self) -> bool {
        self.index() < HARDENED_OFFSET
    }

    /// The 32-bit value fed into child key derivation
    pub fn to_u32(&self) -> u32 {
        match *self {
            Self::Normal(index) => index,
            Self::Hardened(index) => index | HARDENED_OFFSET,
        }
    }
}

impl From<u32> for ChildNumber {
    fn from(value: u32) -> Self {
        if value >= HARDENED_OFFSET {
            Self::Hardened(value - HARDENED_OFFSET)
        } else {
            Self::Normal(value)
        }
    }
}

impl fmt::Display for ChildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal(index) => write!(f, "{}", index),
            Self::Hardened(index) => write!(f, "{}'", index),
        }
    }
}

/// An ordered sequence of child numbers starting at the master key
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<ChildNumber>);

impl DerivationPath {
    /// The master path `m`
    pub fn master() -> Self {
        Self(Vec::new())
    }

    /// Append a segment
    pub fn extend(mut self, child: ChildNumber) -> Self {
        self.0.push(child);
        self
    }

    pub fn segments(&self) -> &[ChildNumber] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for child in &self.0 {
            write!(f, "/{}", child)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = Error;

    /// Parse a BIP-32 path such as `m/84'/0'/0'/0/5`
    fn from_str(path: &str) -> Result<Self> {
        let mut components = path.split('/');
        if components.next() != Some("m") {
            return Err(Error::KeyDerivation(format!("Invalid derivation path: {}", path)));
        }

        let mut result = Self::master();
        for component in components {
            let invalid = || Error::KeyDerivation(format!("Invalid derivation path component: {}", component));
            let child = match component.strip_suffix('\'').or_else(|| component.strip_suffix('h')) {
                Some(index) => ChildNumber::hardened(index.parse().map_err(|_| invalid())?),
                None => ChildNumber::normal(component.parse().map_err(|_| invalid())?),
            }
            .map_err(|_| invalid())?;
            result = result.extend(child);
        }

        Ok(result)
    }
}

/// Build the account-level path `m/purpose'/coin_type'/0'/0`
///
/// Testnets use coin type 1 regardless of the coin, per BIP44.
pub fn derive_path(address_type: AddressType, network: Network) -> Result<DerivationPath> {
    let purpose = address_type.purpose().ok_or_else(|| {
        Error::UnsupportedAddressType(format!("{:?} does not support HD wallets", address_type))
    })?;

    let coin_type = if network.is_mainnet() { network.coin_id() } else { 1 };

    Ok(DerivationPath::master()
        .extend(ChildNumber::hardened(purpose)?)
        .extend(ChildNumber::hardened(coin_type)?)
        .extend(ChildNumber::hardened(0)?)
        .extend(ChildNumber::normal(0)?))
}
