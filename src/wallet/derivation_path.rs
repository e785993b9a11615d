//! Derivation Paths
//!
//! BIP32 path grammar (`m/44'/0'/0'/0/0`) and the BIP44/BIP86 layouts.

use std::fmt;
use std::str::FromStr;

use crate::error::{WalletError, WalletResult};

/// Standard BIP purposes
pub mod purpose {
    pub const BIP44: u32 = 44; // Legacy (P2PKH)
    pub const BIP86: u32 = 86; // Taproot (P2TR)
}

/// Hardened offset for BIP32 derivation
pub const HARDENED: u32 = 0x8000_0000;

/// Single step of a derivation path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildNumber {
    index: u32,
    hardened: bool,
}

impl ChildNumber {
    /// Build a child number; `index` must be below 2^31
    pub fn new(index: u32, hardened: bool) -> WalletResult<Self> {
        if index >= HARDENED {
            return Err(WalletError::invalid_path(format!(
                "Child index {} exceeds maximum value",
                index
            )));
        }
        Ok(Self { index, hardened })
    }

    pub fn normal(index: u32) -> WalletResult<Self> {
        Self::new(index, false)
    }

    pub fn hardened(index: u32) -> WalletResult<Self> {
        Self::new(index, true)
    }

    /// Decode a serialized child number (hardened bit included)
    pub const fn from_value(value: u32) -> Self {
        Self {
            index: value & !HARDENED,
            hardened: value & HARDENED != 0,
        }
    }

    pub const fn index(self) -> u32 {
        self.index
    }

    pub const fn is_hardened(self) -> bool {
        self.hardened
    }

    /// Full index including the hardened bit
    pub const fn value(self) -> u32 {
        if self.hardened {
            self.index | HARDENED
        } else {
            self.index
        }
    }

    /// Next index in the same (hardened or normal) space
    pub fn next(self) -> Option<Self> {
        let index = self.index.checked_add(1)?;
        (index < HARDENED).then_some(Self {
            index,
            hardened: self.hardened,
        })
    }
}

impl fmt::Display for ChildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

impl FromStr for ChildNumber {
    type Err = WalletError;

    fn from_str(s: &str) -> WalletResult<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(WalletError::invalid_path("Empty path component"));
        }

        let (number, hardened) = match trimmed.strip_suffix(|c: char| matches!(c, '\'' | 'h' | 'H')) {
            Some(rest) => (rest, true),
            None => (trimmed, false),
        };

        let index: u32 = number
            .parse()
            .map_err(|e| WalletError::invalid_path(format!("Invalid path component '{}': {}", s, e)))?;

        ChildNumber::new(index, hardened)
    }
}

/// Ordered list of child numbers from the master node
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DerivationPath {
    components: Vec<ChildNumber>,
}

impl DerivationPath {
    /// The master node itself (`m`)
    pub fn master() -> Self {
        Self::default()
    }

    /// `m/44'/coin'/account'/change/index`
    pub fn bip44(coin_type: u32, account: u32, change: u32, index: u32) -> WalletResult<Self> {
        Self::account_layout(purpose::BIP44, coin_type, account, change, index)
    }

    /// `m/86'/coin'/account'/change/index`
    pub fn bip86(coin_type: u32, account: u32, change: u32, index: u32) -> WalletResult<Self> {
        Self::account_layout(purpose::BIP86, coin_type, account, change, index)
    }

    /// `m/44'/coin'/account'`, the node exported as the account xpub
    pub fn bip44_account(coin_type: u32, account: u32) -> WalletResult<Self> {
        Ok(Self {
            components: vec![
                ChildNumber::hardened(purpose::BIP44)?,
                ChildNumber::hardened(coin_type)?,
                ChildNumber::hardened(account)?,
            ],
        })
    }

    fn account_layout(
        purpose: u32,
        coin_type: u32,
        account: u32,
        change: u32,
        index: u32,
    ) -> WalletResult<Self> {
        if change > 1 {
            return Err(WalletError::invalid_path(format!(
                "Change must be 0 (external) or 1 (internal), got {}",
                change
            )));
        }

        Ok(Self {
            components: vec![
                ChildNumber::hardened(purpose)?,
                ChildNumber::hardened(coin_type)?,
                ChildNumber::hardened(account)?,
                ChildNumber::normal(change)?,
                ChildNumber::normal(index)?,
            ],
        })
    }

    /// Append a component, returning the extended path
    pub fn child(mut self, child: ChildNumber) -> Self {
        self.components.push(child);
        self
    }

    pub fn components(&self) -> &[ChildNumber] {
        &self.components
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChildNumber> {
        self.components.iter()
    }

    pub fn depth(&self) -> usize {
        self.components.len()
    }

    pub fn is_master(&self) -> bool {
        self.components.is_empty()
    }

    pub fn purpose(&self) -> Option<u32> {
        self.components.first().map(|c| c.index())
    }

    pub fn coin_type(&self) -> Option<u32> {
        self.components.get(1).map(|c| c.index())
    }

    pub fn account(&self) -> Option<u32> {
        self.components.get(2).map(|c| c.index())
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl FromStr for DerivationPath {
    type Err = WalletError;

    fn from_str(path: &str) -> WalletResult<Self> {
        let trimmed = path.trim();

        let rest = match trimmed {
            "m" | "M" => return Ok(Self::master()),
            _ => trimmed
                .strip_prefix("m/")
                .or_else(|| trimmed.strip_prefix("M/"))
                .ok_or_else(|| WalletError::invalid_path("Derivation path must start with 'm/'"))?,
        };

        let components = rest
            .split('/')
            .map(ChildNumber::from_str)
            .collect::<WalletResult<Vec<_>>>()?;

        Ok(Self { components })
    }
}

impl<'a> IntoIterator for &'a DerivationPath {
    type Item = &'a ChildNumber;
    type IntoIter = std::slice::Iter<'a, ChildNumber>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_parse_standard_path() {
        let path: DerivationPath = "m/44'/0'/0'/0/0".parse().unwrap();
        assert_eq!(path.depth(), 5);
        assert_eq!(path.purpose(), Some(44));
        assert_eq!(path.coin_type(), Some(0));
        assert_eq!(path.account(), Some(0));
        assert!(path.components()[2].is_hardened());
        assert!(!path.components()[3].is_hardened());
        assert_eq!(path, DerivationPath::bip44(0, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_hardened_markers() {
        let a: DerivationPath = "m/86h/1H/0'".parse().unwrap();
        assert_eq!(a.to_string(), "m/86'/1'/0'");
    }

    #[test]
    fn test_display_round_trip() {
        let path = DerivationPath::bip86(1, 2, 1, 7).unwrap();
        assert_eq!(path.to_string(), "m/86'/1'/2'/1/7");
        assert_eq!(path.to_string().parse::<DerivationPath>().unwrap(), path);
    }

    #[test]
    fn test_master_path() {
        let path: DerivationPath = "m".parse().unwrap();
        assert!(path.is_master());
        assert_eq!(path.to_string(), "m");
    }

    #[test]
    fn test_invalid_paths() {
        for bad in ["", "44'/0'", "m/", "m//0", "m/x", "m/2147483648", "m/-1", "m/0''"] {
            let err = bad.parse::<DerivationPath>().unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidPath, "path {:?}", bad);
        }
    }

    #[test]
    fn test_change_must_be_binary() {
        let err = DerivationPath::bip44(0, 0, 2, 0).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPath);
    }

    #[test]
    fn test_child_number_value() {
        let hardened = ChildNumber::hardened(44).unwrap();
        assert_eq!(hardened.value(), 0x8000_002c);
        assert_eq!(ChildNumber::from_value(0x8000_002c), hardened);
        assert_eq!(ChildNumber::from_value(7), ChildNumber::normal(7).unwrap());
    }

    #[test]
    fn test_child_number_next() {
        let last = ChildNumber::normal(HARDENED - 1).unwrap();
        assert_eq!(last.next(), None);
        assert_eq!(
            ChildNumber::hardened(0).unwrap().next(),
            Some(ChildNumber::hardened(1).unwrap())
        );
    }
}
