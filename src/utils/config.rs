//! Wallet Configuration
//!
//! Process-wide defaults for wallet construction and logging:
//! - Default mnemonic length and BIP39 passphrase
//! - Default BIP44 account for address queries
//! - Debug logging and log redaction flags
//!
//! Values come from `WalletConfig::default()`, environment variables, or
//! runtime updates through [`update_config`].

use std::fmt;
use std::sync::{OnceLock, RwLock};

use zeroize::Zeroizing;

use crate::error::{WalletError, WalletResult};
use crate::wallet::derivation_path::HARDENED;
use crate::wallet::mnemonic::WordCount;

use super::logging;

pub const ENV_WORD_COUNT: &str = "HDWALLET_WORD_COUNT";
pub const ENV_PASSPHRASE: &str = "HDWALLET_PASSPHRASE";
pub const ENV_ACCOUNT: &str = "HDWALLET_ACCOUNT";
pub const ENV_DEBUG: &str = "HDWALLET_DEBUG";

/// Wallet defaults
#[derive(Clone, PartialEq, Eq)]
pub struct WalletConfig {
    /// Length of freshly generated mnemonics
    pub word_count: WordCount,
    /// BIP39 passphrase applied when stretching mnemonics
    pub passphrase: Zeroizing<String>,
    /// Account used when a caller does not name one
    pub default_account: u32,
    /// Emit debug-level log lines
    pub debug_logging: bool,
    /// Redact sensitive fields in log output
    pub redact_logs: bool,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            word_count: WordCount::Words12,
            passphrase: Zeroizing::new(String::new()),
            default_account: 0,
            debug_logging: false,
            redact_logs: true,
        }
    }
}

impl fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConfig")
            .field("word_count", &self.word_count)
            .field("passphrase", &if self.passphrase.is_empty() { "" } else { "[REDACTED]" })
            .field("default_account", &self.default_account)
            .field("debug_logging", &self.debug_logging)
            .field("redact_logs", &self.redact_logs)
            .finish()
    }
}

impl WalletConfig {
    /// Defaults overridden by `HDWALLET_*` environment variables
    pub fn from_env() -> WalletResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> WalletResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_WORD_COUNT) {
            let words: usize = raw.trim().parse().map_err(|_| {
                WalletError::invalid_input(format!("{} must be a number", ENV_WORD_COUNT))
            })?;
            config.word_count = WordCount::try_from(words)?;
        }

        if let Some(passphrase) = lookup(ENV_PASSPHRASE) {
            config.passphrase = Zeroizing::new(passphrase);
        }

        if let Some(raw) = lookup(ENV_ACCOUNT) {
            config.default_account = raw.trim().parse().map_err(|_| {
                WalletError::invalid_input(format!("{} must be a number", ENV_ACCOUNT))
            })?;
        }

        if let Some(raw) = lookup(ENV_DEBUG) {
            config.debug_logging = parse_flag(&raw).ok_or_else(|| {
                WalletError::invalid_input(format!("{} must be true/false or 1/0", ENV_DEBUG))
            })?;
        }

        Ok(config)
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// Validate settings consistency
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if !self.redact_logs {
            warnings.push("Warning: Log redaction disabled, full addresses will be logged".to_string());
        }

        if self.default_account >= HARDENED {
            warnings.push(format!(
                "Warning: Default account {} cannot be hardened, derivation will fail",
                self.default_account
            ));
        } else if self.default_account > 100 {
            warnings.push(format!(
                "Warning: Unusual default account {}. Most wallets use 0",
                self.default_account
            ));
        }

        warnings
    }

    /// Push the logging flags into the logger
    pub fn apply_logging(&self) {
        logging::set_debug_enabled(self.debug_logging);
        logging::set_redaction_enabled(self.redact_logs);
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Global configuration holder
pub struct ConfigStore {
    config: RwLock<WalletConfig>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self {
            config: RwLock::new(WalletConfig::default()),
        }
    }

    /// Snapshot of the current configuration. A poisoned lock is an error,
    /// never a silent fallback to defaults.
    pub fn get(&self) -> WalletResult<WalletConfig> {
        self.config
            .read()
            .map(|c| c.clone())
            .map_err(|_| WalletError::internal("Config lock poisoned"))
    }

    /// Replace the configuration, returning validation warnings
    pub fn set(&self, config: WalletConfig) -> WalletResult<Vec<String>> {
        self.update(|current| *current = config)
    }

    /// Update in place, returning validation warnings
    pub fn update<F>(&self, updater: F) -> WalletResult<Vec<String>>
    where
        F: FnOnce(&mut WalletConfig),
    {
        let mut config = self
            .config
            .write()
            .map_err(|_| WalletError::internal("Config lock poisoned"))?;
        updater(&mut config);
        config.apply_logging();
        Ok(config.validate())
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

static CONFIG: OnceLock<ConfigStore> = OnceLock::new();

/// Get the global configuration store
pub fn config_store() -> &'static ConfigStore {
    CONFIG.get_or_init(ConfigStore::new)
}

/// Snapshot of the global configuration
pub fn get_config() -> WalletResult<WalletConfig> {
    config_store().get()
}

pub fn set_config(config: WalletConfig) -> WalletResult<Vec<String>> {
    config_store().set(config)
}

pub fn update_config<F>(updater: F) -> WalletResult<Vec<String>>
where
    F: FnOnce(&mut WalletConfig),
{
    config_store().update(updater)
}
