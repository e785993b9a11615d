//! Shared types for the HD wallet core
//!
//! Domain values that cross module boundaries are defined here
//! for consistent serialization and FFI compatibility.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{WalletError, WalletResult};

// =============================================================================
// Coin Types
// =============================================================================

/// Registered SLIP-44 coin types supported by the address encoder.
///
/// The integer selectors observed at the binding boundary (coin type and
/// network flag) both index this registry: `0` is Bitcoin mainnet and `1` is
/// the shared testnet coin type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoinType {
    Bitcoin,
    BitcoinTestnet,
    Litecoin,
    Dogecoin,
    Ethereum,
}

impl CoinType {
    pub const ALL: [CoinType; 5] = [
        CoinType::Bitcoin,
        CoinType::BitcoinTestnet,
        CoinType::Litecoin,
        CoinType::Dogecoin,
        CoinType::Ethereum,
    ];

    /// SLIP-44 index used at depth 1 of the BIP44 path
    pub const fn index(self) -> u32 {
        match self {
            CoinType::Bitcoin => 0,
            CoinType::BitcoinTestnet => 1,
            CoinType::Litecoin => 2,
            CoinType::Dogecoin => 3,
            CoinType::Ethereum => 60,
        }
    }

    /// Network used for extended key serialization (xprv vs tprv)
    pub const fn network(self) -> Network {
        match self {
            CoinType::BitcoinTestnet => Network::Testnet,
            _ => Network::Mainnet,
        }
    }

    pub const fn is_testnet(self) -> bool {
        matches!(self, CoinType::BitcoinTestnet)
    }

    /// Whether the coin uses Bitcoin script addresses (and therefore BIP86)
    pub const fn is_bitcoin(self) -> bool {
        matches!(self, CoinType::Bitcoin | CoinType::BitcoinTestnet)
    }

    /// Base58Check version byte for pay-to-pubkey-hash addresses
    pub const fn p2pkh_version(self) -> Option<u8> {
        match self {
            CoinType::Bitcoin => Some(0x00),
            CoinType::BitcoinTestnet => Some(0x6f),
            CoinType::Litecoin => Some(0x30),
            CoinType::Dogecoin => Some(0x1e),
            CoinType::Ethereum => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            CoinType::Bitcoin => "BTC",
            CoinType::BitcoinTestnet => "tBTC",
            CoinType::Litecoin => "LTC",
            CoinType::Dogecoin => "DOGE",
            CoinType::Ethereum => "ETH",
        }
    }
}

impl TryFrom<u32> for CoinType {
    type Error = WalletError;

    fn try_from(value: u32) -> WalletResult<Self> {
        CoinType::ALL
            .into_iter()
            .find(|coin| coin.index() == value)
            .ok_or_else(|| WalletError::unsupported_coin_type(value))
    }
}

impl fmt::Display for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol(), self.index())
    }
}

// =============================================================================
// Network
// =============================================================================

/// Network kind for BIP32 extended key version bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub const XPRV_MAINNET: [u8; 4] = [0x04, 0x88, 0xAD, 0xE4];
    pub const XPUB_MAINNET: [u8; 4] = [0x04, 0x88, 0xB2, 0x1E];
    pub const XPRV_TESTNET: [u8; 4] = [0x04, 0x35, 0x83, 0x94];
    pub const XPUB_TESTNET: [u8; 4] = [0x04, 0x35, 0x87, 0xCF];

    pub const fn private_version(self) -> [u8; 4] {
        match self {
            Network::Mainnet => Self::XPRV_MAINNET,
            Network::Testnet => Self::XPRV_TESTNET,
        }
    }

    pub const fn public_version(self) -> [u8; 4] {
        match self {
            Network::Mainnet => Self::XPUB_MAINNET,
            Network::Testnet => Self::XPUB_TESTNET,
        }
    }

    /// Bitcoin network used for script address encoding
    pub const fn to_bitcoin_network(self) -> bitcoin::Network {
        match self {
            Network::Mainnet => bitcoin::Network::Bitcoin,
            Network::Testnet => bitcoin::Network::Testnet,
        }
    }

    /// Bitcoin coin type matching this network
    pub const fn bitcoin_coin(self) -> CoinType {
        match self {
            Network::Mainnet => CoinType::Bitcoin,
            Network::Testnet => CoinType::BitcoinTestnet,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Summary of a wallet emitted by the CLI with `--json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletReport {
    pub coin_type: u32,
    pub network: Network,
    pub mnemonic: Option<String>,
    pub seed_hex: Option<String>,
    pub master_xprv: String,
    pub path: String,
    pub public_key_hex: String,
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_coin_type_registry() {
        assert_eq!(CoinType::try_from(0).unwrap(), CoinType::Bitcoin);
        assert_eq!(CoinType::try_from(1).unwrap(), CoinType::BitcoinTestnet);
        assert_eq!(CoinType::try_from(60).unwrap(), CoinType::Ethereum);

        let err = CoinType::try_from(7).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedCoinType);
    }

    #[test]
    fn test_coin_type_network() {
        assert_eq!(CoinType::Bitcoin.network(), Network::Mainnet);
        assert_eq!(CoinType::BitcoinTestnet.network(), Network::Testnet);
        assert_eq!(CoinType::Dogecoin.network(), Network::Mainnet);
        assert!(CoinType::BitcoinTestnet.is_bitcoin());
        assert!(!CoinType::Litecoin.is_bitcoin());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&CoinType::BitcoinTestnet).unwrap();
        assert_eq!(json, "\"bitcoin-testnet\"");
        let json = serde_json::to_string(&Network::Testnet).unwrap();
        assert_eq!(json, "\"testnet\"");
    }
}
