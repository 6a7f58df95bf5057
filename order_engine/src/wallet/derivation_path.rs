use std::{fmt::Display, str::FromStr};

use super::WalletError;

/// Child indices at or above this value are hardened.
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

const BIP44_PURPOSE: u32 = 44;

/// One step in a derivation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildNumber {
    index: u32,
    hardened: bool,
}

impl ChildNumber {
    pub fn normal(index: u32) -> Result<Self, WalletError> {
        Self::new(index, false)
    }

    pub fn hardened(index: u32) -> Result<Self, WalletError> {
        Self::new(index, true)
    }

    fn new(index: u32, hardened: bool) -> Result<Self, WalletError> {
        if index >= HARDENED_OFFSET {
            return Err(WalletError::InvalidPath(format!("Child index {index} is out of range")));
        }
        Ok(Self { index, hardened })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_hardened(&self) -> bool {
        self.hardened
    }

    /// The value handed to BIP-32 child key derivation.
    pub fn to_bip32_index(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED_OFFSET
        } else {
            self.index
        }
    }
}

impl Display for ChildNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

impl FromStr for ChildNumber {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (digits, hardened) = match s.strip_suffix(['\'', 'h', 'H']) {
            Some(d) => (d, true),
            None => (s, false),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(WalletError::InvalidPath(format!("'{s}' is not a valid path segment")));
        }
        let index = digits
            .parse::<u32>()
            .map_err(|_| WalletError::InvalidPath(format!("Path segment '{s}' is out of range")))?;
        Self::new(index, hardened)
    }
}

/// A BIP-44 derivation path: `m / 44' / coin_type' / account' / change / address_index`.
///
/// The first three levels are always hardened and the last two never are. Anything else is rejected when parsing, so
/// a stored path string maps to exactly one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    segments: [ChildNumber; 5],
}

impl DerivationPath {
    pub fn bip44(coin_type: u32, account: u32, change: u32, address_index: u32) -> Result<Self, WalletError> {
        let segments = [
            ChildNumber::hardened(BIP44_PURPOSE)?,
            ChildNumber::hardened(coin_type)?,
            ChildNumber::hardened(account)?,
            ChildNumber::normal(change)?,
            ChildNumber::normal(address_index)?,
        ];
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[ChildNumber] {
        &self.segments
    }

    pub fn coin_type(&self) -> u32 {
        self.segments[1].index()
    }

    pub fn account(&self) -> u32 {
        self.segments[2].index()
    }

    pub fn change(&self) -> u32 {
        self.segments[3].index()
    }

    pub fn address_index(&self) -> u32 {
        self.segments[4].index()
    }
}

impl Display for DerivationPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "m")?;
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('/');
        if parts.next() != Some("m") {
            return Err(WalletError::InvalidPath(format!("'{s}' must start with 'm/'")));
        }
        let segments = parts.map(ChildNumber::from_str).collect::<Result<Vec<_>, _>>()?;
        let segments: [ChildNumber; 5] = segments.try_into().map_err(|v: Vec<ChildNumber>| {
            WalletError::InvalidPath(format!("'{s}' has {} levels. BIP-44 paths have exactly 5", v.len()))
        })?;
        let hardening = segments.iter().map(ChildNumber::is_hardened).collect::<Vec<_>>();
        if hardening != [true, true, true, false, false] {
            return Err(WalletError::InvalidPath(format!(
                "'{s}' must harden the purpose, coin and account levels, and only those"
            )));
        }
        if segments[0].index() != BIP44_PURPOSE {
            return Err(WalletError::InvalidPath(format!("'{s}' does not use purpose 44'")));
        }
        Ok(Self { segments })
    }
}
