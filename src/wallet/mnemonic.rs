//! Mnemonic Codec
//!
//! BIP39 encoding of entropy into words from the English list and back.
//!
//! SECURITY: Entropy and phrase buffers are zeroized on drop.
//!
//! The checksum only detects tampering probabilistically: a single altered
//! word in a 12-word phrase passes the 4-bit checksum about once in 16
//! attempts, a 24-word phrase about once in 256.

use std::fmt;
use std::str::FromStr;

use bip39::Language;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;
use zeroize::Zeroizing;

use crate::error::{ErrorCode, WalletError, WalletResult};

use super::seed::{derive_seed, Seed};

/// Bits encoded by each word
const BITS_PER_WORD: usize = 11;

/// Raw entropy, cleared when dropped
pub type Entropy = Zeroizing<Vec<u8>>;

/// Supported phrase lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WordCount {
    #[default]
    Words12,
    Words15,
    Words18,
    Words21,
    Words24,
}

impl WordCount {
    pub const fn words(self) -> usize {
        match self {
            WordCount::Words12 => 12,
            WordCount::Words15 => 15,
            WordCount::Words18 => 18,
            WordCount::Words21 => 21,
            WordCount::Words24 => 24,
        }
    }

    /// Entropy size in bytes (16, 20, 24, 28 or 32)
    pub const fn entropy_bytes(self) -> usize {
        self.words() * BITS_PER_WORD * 32 / 33 / 8
    }

    /// Checksum length in bits, ENT / 32
    pub const fn checksum_bits(self) -> usize {
        self.entropy_bytes() / 4
    }

    fn from_entropy_len(len: usize) -> WalletResult<Self> {
        match len {
            16 => Ok(WordCount::Words12),
            20 => Ok(WordCount::Words15),
            24 => Ok(WordCount::Words18),
            28 => Ok(WordCount::Words21),
            32 => Ok(WordCount::Words24),
            _ => Err(WalletError::new(
                ErrorCode::InvalidWordCount,
                format!("entropy of {} bytes does not map to a supported word count", len),
            )),
        }
    }
}

impl TryFrom<usize> for WordCount {
    type Error = WalletError;

    fn try_from(words: usize) -> WalletResult<Self> {
        match words {
            12 => Ok(WordCount::Words12),
            15 => Ok(WordCount::Words15),
            18 => Ok(WordCount::Words18),
            21 => Ok(WordCount::Words21),
            24 => Ok(WordCount::Words24),
            other => Err(WalletError::invalid_word_count(other)),
        }
    }
}

impl fmt::Display for WordCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} words", self.words())
    }
}

/// A checksum-valid BIP39 phrase.
///
/// Only constructed through [`Mnemonic::parse`] or the encoders below, so
/// every instance decodes back to its entropy.
#[derive(Clone, PartialEq, Eq)]
pub struct Mnemonic {
    phrase: Zeroizing<String>,
    entropy: Entropy,
}

impl Mnemonic {
    /// Parse a phrase. Input is NFKD-normalized and split on any whitespace.
    pub fn parse(phrase: &str) -> WalletResult<Self> {
        let normalized = Zeroizing::new(phrase.nfkd().collect::<String>());
        let words: Vec<&str> = normalized.split_whitespace().collect();
        let entropy = decode_words(&words)?;

        Ok(Self {
            phrase: Zeroizing::new(words.join(" ")),
            entropy,
        })
    }

    /// Canonical single-space separated phrase
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn word_count(&self) -> WordCount {
        // entropy length is checked on construction
        WordCount::from_entropy_len(self.entropy.len()).unwrap_or_default()
    }

    pub fn entropy(&self) -> &[u8] {
        &self.entropy
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.phrase.split(' ')
    }

    /// Stretch into a BIP39 seed
    pub fn to_seed(&self, passphrase: &str) -> Seed {
        derive_seed(&self.phrase, passphrase)
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.phrase)
    }
}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mnemonic")
            .field("words", &self.word_count().words())
            .field("phrase", &"[REDACTED]")
            .finish()
    }
}

impl FromStr for Mnemonic {
    type Err = WalletError;

    fn from_str(s: &str) -> WalletResult<Self> {
        Mnemonic::parse(s)
    }
}

fn word_index(word: &str) -> Option<usize> {
    let list: &[&str] = Language::English.word_list();
    list.binary_search(&word).ok()
}

/// Generate a phrase of `word_count` words from the OS entropy source
pub fn generate_mnemonic(word_count: usize) -> WalletResult<Mnemonic> {
    let count = WordCount::try_from(word_count)?;

    let mut entropy = Zeroizing::new(vec![0u8; count.entropy_bytes()]);
    OsRng
        .try_fill_bytes(entropy.as_mut_slice())
        .map_err(|e| WalletError::internal(format!("Entropy source failed: {}", e)))?;

    entropy_to_mnemonic(&entropy)
}

/// Encode entropy as a phrase, appending the SHA-256 checksum bits
pub fn entropy_to_mnemonic(entropy: &[u8]) -> WalletResult<Mnemonic> {
    let count = WordCount::from_entropy_len(entropy.len())?;
    let list = Language::English.word_list();
    let checksum = Sha256::digest(entropy);

    // entropy bits followed by the checksum bits
    let mut bits = Zeroizing::new(Vec::with_capacity(entropy.len() + 1));
    bits.extend_from_slice(entropy);
    bits.push(checksum[0]);

    let bit_at = |pos: usize| (bits[pos / 8] >> (7 - pos % 8)) & 1;

    let mut phrase = Zeroizing::new(String::with_capacity(count.words() * 9));
    for word in 0..count.words() {
        let mut index = 0usize;
        for offset in 0..BITS_PER_WORD {
            index = (index << 1) | bit_at(word * BITS_PER_WORD + offset) as usize;
        }
        if word > 0 {
            phrase.push(' ');
        }
        phrase.push_str(list[index]);
    }

    Ok(Mnemonic {
        phrase,
        entropy: Zeroizing::new(entropy.to_vec()),
    })
}

/// Decode a phrase back into its entropy, verifying the checksum
pub fn mnemonic_to_entropy(phrase: &str) -> WalletResult<Entropy> {
    let normalized = Zeroizing::new(phrase.nfkd().collect::<String>());
    let words: Vec<&str> = normalized.split_whitespace().collect();
    decode_words(&words)
}

fn decode_words(words: &[&str]) -> WalletResult<Entropy> {
    let count = WordCount::try_from(words.len())?;

    let total_bits = words.len() * BITS_PER_WORD;
    let mut bits = Zeroizing::new(vec![0u8; total_bits.div_ceil(8)]);

    for (i, word) in words.iter().enumerate() {
        let index = word_index(word).ok_or_else(|| WalletError::unknown_word(i + 1))?;
        for offset in 0..BITS_PER_WORD {
            if (index >> (BITS_PER_WORD - 1 - offset)) & 1 == 1 {
                let pos = i * BITS_PER_WORD + offset;
                bits[pos / 8] |= 1 << (7 - pos % 8);
            }
        }
    }

    let entropy_len = count.entropy_bytes();
    let entropy = Zeroizing::new(bits[..entropy_len].to_vec());

    let checksum = Sha256::digest(entropy.as_slice());
    let mask = 0xffu8 << (8 - count.checksum_bits());
    if bits[entropy_len] & mask != checksum[0] & mask {
        return Err(WalletError::checksum_mismatch());
    }

    Ok(entropy)
}

/// Check a phrase without keeping the decoded entropy
pub fn is_valid_mnemonic(phrase: &str) -> bool {
    mnemonic_to_entropy(phrase).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_word_count_sizes() {
        let sizes: Vec<(usize, usize, usize)> = [12, 15, 18, 21, 24]
            .iter()
            .map(|&w| {
                let count = WordCount::try_from(w).unwrap();
                (count.words(), count.entropy_bytes(), count.checksum_bits())
            })
            .collect();

        assert_eq!(
            sizes,
            vec![(12, 16, 4), (15, 20, 5), (18, 24, 6), (21, 28, 7), (24, 32, 8)]
        );
    }

    #[test]
    fn test_invalid_word_count() {
        for bad in [0, 11, 13, 23, 25] {
            let err = generate_mnemonic(bad).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidWordCount);
        }
    }

    #[test]
    fn test_zero_entropy_vector() {
        let mnemonic = entropy_to_mnemonic(&[0u8; 16]).unwrap();
        assert_eq!(mnemonic.phrase(), ABANDON_ABOUT);

        let long = entropy_to_mnemonic(&[0u8; 32]).unwrap();
        assert_eq!(long.phrase(), format!("{} art", ["abandon"; 23].join(" ")));
    }

    #[test]
    fn test_legal_winner_vector() {
        let mnemonic = entropy_to_mnemonic(&[0x7f; 16]).unwrap();
        assert_eq!(
            mnemonic.phrase(),
            "legal winner thank year wave sausage worth useful legal winner thank yellow"
        );
        assert_eq!(mnemonic_to_entropy(mnemonic.phrase()).unwrap().as_slice(), &[0x7f; 16]);
    }

    #[test]
    fn test_generate_round_trip_all_sizes() {
        for words in [12, 15, 18, 21, 24] {
            let mnemonic = generate_mnemonic(words).unwrap();
            assert_eq!(mnemonic.word_count().words(), words);
            assert_eq!(mnemonic.words().count(), words);

            let entropy = mnemonic_to_entropy(mnemonic.phrase()).unwrap();
            assert_eq!(entropy.as_slice(), mnemonic.entropy());
        }
    }

    #[test]
    fn test_matches_bip39_crate() {
        for words in [12, 18, 24] {
            let mnemonic = generate_mnemonic(words).unwrap();
            let reference = bip39::Mnemonic::from_entropy(mnemonic.entropy()).unwrap();
            assert_eq!(reference.to_string(), mnemonic.phrase());
        }
    }

    #[test]
    fn test_unknown_word_reports_position() {
        let phrase = ABANDON_ABOUT.replacen("abandon", "bitcoinz", 1);
        let err = Mnemonic::parse(&phrase).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownWord);
        assert_eq!(err.details.as_deref(), Some("position 1"));
        assert!(!err.to_string().contains("bitcoinz"));
    }

    #[test]
    fn test_checksum_mismatch() {
        let phrase = ["abandon"; 12].join(" ");
        let err = mnemonic_to_entropy(&phrase).unwrap_err();
        assert_eq!(err.code, ErrorCode::ChecksumMismatch);
        assert!(!is_valid_mnemonic(&phrase));
    }

    #[test]
    fn test_case_is_significant() {
        let err = Mnemonic::parse(&ABANDON_ABOUT.to_uppercase()).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownWord);
    }

    #[test]
    fn test_whitespace_is_normalized() {
        let messy = format!("  {}\n", ABANDON_ABOUT.replace(' ', " \t "));
        let mnemonic: Mnemonic = messy.parse().unwrap();
        assert_eq!(mnemonic.phrase(), ABANDON_ABOUT);
        assert_eq!(mnemonic.to_string(), ABANDON_ABOUT);
    }

    #[test]
    fn test_debug_is_redacted() {
        let mnemonic = Mnemonic::parse(ABANDON_ABOUT).unwrap();
        let debug = format!("{:?}", mnemonic);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("abandon"));
    }

    #[test]
    fn test_entropy_length_rejected() {
        let err = entropy_to_mnemonic(&[1u8; 17]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidWordCount);
    }
}
