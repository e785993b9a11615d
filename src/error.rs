//! Unified error types for the HD wallet core
//!
//! All errors flow through this module for consistent handling
//! and FFI-safe error reporting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all wallet operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl WalletError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_word_count(count: usize) -> Self {
        Self::new(
            ErrorCode::InvalidWordCount,
            format!("invalid word count {}, must be 12, 15, 18, 21, or 24", count),
        )
    }

    pub fn checksum_mismatch() -> Self {
        Self::new(ErrorCode::ChecksumMismatch, "Mnemonic checksum does not match")
    }

    pub fn unknown_word(position: usize) -> Self {
        // The word itself is never echoed back, it may be part of a secret phrase
        Self::new(ErrorCode::UnknownWord, "Mnemonic contains a word outside the word list")
            .with_details(format!("position {}", position))
    }

    pub fn invalid_seed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidSeedEncoding, msg)
    }

    pub fn unsupported_coin_type(coin_type: u32) -> Self {
        Self::new(
            ErrorCode::UnsupportedCoinType,
            format!("Coin type {} is not registered", coin_type),
        )
    }

    pub fn invalid_path(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPath, msg)
    }

    pub fn private_key_required() -> Self {
        Self::new(
            ErrorCode::PrivateKeyRequired,
            "Hardened derivation requires a private key",
        )
    }

    pub fn mnemonic_unavailable() -> Self {
        Self::new(
            ErrorCode::MnemonicUnavailable,
            "Wallet was not constructed from a mnemonic",
        )
    }

    pub fn invalid_extended_key(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidExtendedKey, msg)
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for WalletError {}

/// Error codes for categorization
///
/// The numeric values are part of the C ABI and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Mnemonic errors
    InvalidWordCount,
    ChecksumMismatch,
    UnknownWord,

    // Construction errors
    InvalidSeedEncoding,
    UnsupportedCoinType,
    InvalidExtendedKey,

    // Derivation errors
    InvalidPath,
    PrivateKeyRequired,

    // Export errors
    MnemonicUnavailable,

    // Boundary errors
    InvalidInput,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Stable integer used across the C ABI. Zero is reserved for success.
    pub const fn as_i32(self) -> i32 {
        match self {
            ErrorCode::InvalidWordCount => 1,
            ErrorCode::ChecksumMismatch => 2,
            ErrorCode::UnknownWord => 3,
            ErrorCode::InvalidSeedEncoding => 4,
            ErrorCode::UnsupportedCoinType => 5,
            ErrorCode::InvalidPath => 6,
            ErrorCode::PrivateKeyRequired => 7,
            ErrorCode::MnemonicUnavailable => 8,
            ErrorCode::InvalidExtendedKey => 9,
            ErrorCode::InvalidInput => 10,
            ErrorCode::Internal => 11,
        }
    }

    pub const fn from_i32(value: i32) -> Option<Self> {
        match value {
            1 => Some(ErrorCode::InvalidWordCount),
            2 => Some(ErrorCode::ChecksumMismatch),
            3 => Some(ErrorCode::UnknownWord),
            4 => Some(ErrorCode::InvalidSeedEncoding),
            5 => Some(ErrorCode::UnsupportedCoinType),
            6 => Some(ErrorCode::InvalidPath),
            7 => Some(ErrorCode::PrivateKeyRequired),
            8 => Some(ErrorCode::MnemonicUnavailable),
            9 => Some(ErrorCode::InvalidExtendedKey),
            10 => Some(ErrorCode::InvalidInput),
            11 => Some(ErrorCode::Internal),
            _ => None,
        }
    }

    /// Human readable description of the error category
    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::InvalidWordCount => "unsupported mnemonic word count",
            ErrorCode::ChecksumMismatch => "mnemonic checksum mismatch",
            ErrorCode::UnknownWord => "mnemonic word not in word list",
            ErrorCode::InvalidSeedEncoding => "seed is not valid hex of an accepted length",
            ErrorCode::UnsupportedCoinType => "coin type is not registered",
            ErrorCode::InvalidPath => "invalid derivation path",
            ErrorCode::PrivateKeyRequired => "private key required for hardened derivation",
            ErrorCode::MnemonicUnavailable => "wallet has no mnemonic",
            ErrorCode::InvalidExtendedKey => "invalid extended key",
            ErrorCode::InvalidInput => "invalid input",
            ErrorCode::Internal => "internal error",
        }
    }
}

/// Result type alias for wallet operations
pub type WalletResult<T> = Result<T, WalletError>;

// Conversions from common error types

impl From<hex::FromHexError> for WalletError {
    fn from(e: hex::FromHexError) -> Self {
        WalletError::new(ErrorCode::InvalidSeedEncoding, format!("Invalid seed hex: {}", e))
    }
}

impl From<bitcoin::secp256k1::Error> for WalletError {
    fn from(e: bitcoin::secp256k1::Error) -> Self {
        WalletError::new(ErrorCode::Internal, format!("Secp256k1 error: {}", e))
    }
}

impl From<bitcoin::base58::Error> for WalletError {
    fn from(e: bitcoin::base58::Error) -> Self {
        WalletError::new(ErrorCode::InvalidExtendedKey, format!("Base58 error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = WalletError::unknown_word(3);

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("unknown_word"));
        assert!(json.contains("position 3"));
    }

    #[test]
    fn test_error_display() {
        let err = WalletError::invalid_word_count(13);
        assert_eq!(
            err.to_string(),
            "[InvalidWordCount] invalid word count 13, must be 12, 15, 18, 21, or 24"
        );
    }

    #[test]
    fn test_error_codes_are_stable() {
        let codes = [
            ErrorCode::InvalidWordCount,
            ErrorCode::ChecksumMismatch,
            ErrorCode::UnknownWord,
            ErrorCode::InvalidSeedEncoding,
            ErrorCode::UnsupportedCoinType,
            ErrorCode::InvalidPath,
            ErrorCode::PrivateKeyRequired,
            ErrorCode::MnemonicUnavailable,
            ErrorCode::InvalidExtendedKey,
            ErrorCode::InvalidInput,
            ErrorCode::Internal,
        ];
        for (i, code) in codes.iter().enumerate() {
            assert_eq!(code.as_i32(), i as i32 + 1);
            assert_eq!(ErrorCode::from_i32(code.as_i32()), Some(*code));
        }
        assert_eq!(ErrorCode::from_i32(0), None);
    }

    #[test]
    fn test_hex_error_maps_to_seed_encoding() {
        let err: WalletError = hex::decode("zz").unwrap_err().into();
        assert_eq!(err.code, ErrorCode::InvalidSeedEncoding);
    }
}
