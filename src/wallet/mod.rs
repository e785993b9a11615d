//! Wallet Module
//!
//! Mnemonic codec, seed stretching, the BIP32 key tree, address encoding
//! and the `HdWallet` facade built on top of them.

pub mod address;
pub mod derivation_path;
pub mod extended_key;
pub mod hd_wallet;
pub mod mnemonic;
pub mod seed;

pub use address::*;
pub use derivation_path::{ChildNumber, DerivationPath, HARDENED};
pub use extended_key::{ExtendedKey, KeyMaterial};
pub use hd_wallet::{HdWallet, SeedSource};
pub use mnemonic::{
    entropy_to_mnemonic, generate_mnemonic, is_valid_mnemonic, mnemonic_to_entropy, Entropy,
    Mnemonic, WordCount,
};
pub use seed::{derive_seed, Seed};

use crate::error::WalletResult;
use crate::types::CoinType;

/// Create a new wallet with a freshly generated mnemonic
pub fn create_new_wallet(coin_type: CoinType) -> WalletResult<HdWallet> {
    HdWallet::from_source(coin_type, SeedSource::Generate)
}

/// Restore wallet from mnemonic phrase
pub fn restore_from_mnemonic(coin_type: CoinType, mnemonic: &str) -> WalletResult<HdWallet> {
    HdWallet::from_source(coin_type, SeedSource::mnemonic(mnemonic))
}

/// Validate a mnemonic phrase
pub fn validate_mnemonic(mnemonic: &str) -> bool {
    is_valid_mnemonic(mnemonic)
}
