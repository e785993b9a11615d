//! Seed Derivation
//!
//! BIP39 seed stretching and the BIP32 seed wrapper.
//!
//! SECURITY: `Seed` zeroizes its bytes on drop and never prints them.

use std::fmt;

use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::{WalletError, WalletResult};

/// PBKDF2 iteration count fixed by BIP39
pub const PBKDF2_ROUNDS: u32 = 2048;

/// Length of a stretched mnemonic seed
pub const SEED_LEN: usize = 64;

/// Accepted seed sizes for BIP32 master key generation
pub const MIN_SEED_LEN: usize = 16;
pub const MAX_SEED_LEN: usize = 64;

const SALT_PREFIX: &str = "mnemonic";

/// Root entropy of the key tree
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Seed(Vec<u8>);

impl Seed {
    /// Wrap raw seed bytes, enforcing the BIP32 16..=64 byte range
    pub fn from_bytes(bytes: &[u8]) -> WalletResult<Self> {
        if !(MIN_SEED_LEN..=MAX_SEED_LEN).contains(&bytes.len()) {
            return Err(WalletError::invalid_seed(format!(
                "Seed must be {} to {} bytes, got {}",
                MIN_SEED_LEN,
                MAX_SEED_LEN,
                bytes.len()
            )));
        }
        Ok(Self(bytes.to_vec()))
    }

    /// Decode a hex seed, as accepted at the binding boundary. Surrounding
    /// whitespace is an encoding error.
    pub fn from_hex(seed_hex: &str) -> WalletResult<Self> {
        let bytes = Zeroizing::new(hex::decode(seed_hex)?);
        Self::from_bytes(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl AsRef<[u8]> for Seed {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed([REDACTED; {} bytes])", self.0.len())
    }
}

/// Stretch a mnemonic phrase into a 64-byte seed.
///
/// Both the phrase and the passphrase are NFKD-normalized before hashing.
/// An empty passphrase is valid and is the default everywhere.
pub fn derive_seed(mnemonic_phrase: &str, passphrase: &str) -> Seed {
    let password = Zeroizing::new(mnemonic_phrase.nfkd().collect::<String>());

    let mut salt = Zeroizing::new(String::from(SALT_PREFIX));
    salt.extend(passphrase.nfkd());

    let mut out = vec![0u8; SEED_LEN];
    pbkdf2_hmac::<Sha512>(password.as_bytes(), salt.as_bytes(), PBKDF2_ROUNDS, &mut out);
    Seed(out)
}
