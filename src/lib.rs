//! HD Wallet Core Library
//!
//! Hierarchical deterministic wallet core for thin mobile front ends.
//!
//! # Architecture
//!
//! This crate provides:
//! - **wallet**: BIP39 mnemonics, seed stretching, the BIP32/BIP44 key tree,
//!   address encoding, and the `HdWallet` facade
//! - **ffi**: C-ABI exports with opaque handles and integer error codes
//! - **utils**: Logging, configuration and hash helpers
//!
//! Derivation is bit-exact with other BIP39/BIP32/BIP44 implementations: the
//! same phrase always produces the same address.
//!
//! # Security
//!
//! This crate uses `zeroize` to clear entropy, seeds, phrases and HMAC
//! outputs from memory. `Debug` output never contains key material.
//!
//! # Example
//!
//! ```rust,ignore
//! use hdwallet::HdWallet;
//!
//! let wallet = HdWallet::new(0, None)?;
//! println!("Mnemonic: {}", wallet.export_mnemonic()?);
//! println!("Bitcoin address: {}", wallet.bip44_address());
//! ```

pub mod error;
pub mod ffi;
pub mod types;
pub mod utils;
pub mod wallet;

// Re-export key types for convenience
pub use error::{ErrorCode, WalletError, WalletResult};
pub use types::*;

pub use wallet::{
    create_new_wallet, derive_seed, encode_address, generate_mnemonic, mnemonic_to_entropy,
    restore_from_mnemonic, validate_mnemonic, ChildNumber, DerivationPath, ExtendedKey, HdWallet,
    Mnemonic, Seed, SeedSource, WordCount,
};

pub use utils::config::{get_config, set_config, update_config, WalletConfig};
