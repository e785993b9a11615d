//! HD Wallet
//!
//! Aggregate root tying a seed source and a coin selector to the key tree.
//! A wallet is immutable after construction; the BIP44 account node and the
//! canonical first address are computed once and reused.

use std::fmt;

use bitcoin::hashes::Hash;
use bitcoin::key::TapTweak;
use bitcoin::secp256k1::{All, Keypair, Secp256k1};
use bitcoin::TapNodeHash;
use zeroize::Zeroizing;

use crate::error::{WalletError, WalletResult};
use crate::types::{CoinType, Network, WalletReport};
use crate::utils::config::{config_store, ConfigStore, WalletConfig};

use super::address::{encode_address, encode_evm_address, encode_taproot_address};
use super::derivation_path::DerivationPath;
use super::extended_key::ExtendedKey;
use super::mnemonic::{generate_mnemonic, Mnemonic};
use super::seed::Seed;

/// Where the root of the key tree comes from
pub enum SeedSource {
    /// Raw BIP32 seed, 16 to 64 bytes
    Explicit(Seed),
    /// BIP39 phrase to be validated and stretched
    Mnemonic(Zeroizing<String>),
    /// Fresh phrase from the OS entropy source
    Generate,
    /// Serialized private root (xprv/tprv)
    MasterKey(Zeroizing<String>),
}

impl SeedSource {
    /// Seed-hex entry shape: `None` means generate
    pub fn from_seed_hex(seed_hex: Option<&str>) -> WalletResult<Self> {
        match seed_hex {
            Some(hex) => Ok(SeedSource::Explicit(Seed::from_hex(hex)?)),
            None => Ok(SeedSource::Generate),
        }
    }

    /// Mnemonic entry shape: `None` means generate
    pub fn from_mnemonic(mnemonic: Option<&str>) -> Self {
        match mnemonic {
            Some(phrase) => SeedSource::mnemonic(phrase),
            None => SeedSource::Generate,
        }
    }

    pub fn mnemonic(phrase: &str) -> Self {
        SeedSource::Mnemonic(Zeroizing::new(phrase.to_string()))
    }

    pub fn master_key(xprv: &str) -> Self {
        SeedSource::MasterKey(Zeroizing::new(xprv.to_string()))
    }
}

impl fmt::Debug for SeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeedSource::Explicit(seed) => f.debug_tuple("Explicit").field(seed).finish(),
            SeedSource::Mnemonic(_) => f.write_str("Mnemonic([REDACTED])"),
            SeedSource::Generate => f.write_str("Generate"),
            SeedSource::MasterKey(_) => f.write_str("MasterKey([REDACTED])"),
        }
    }
}

/// Hierarchical deterministic wallet for one coin
pub struct HdWallet {
    secp: Secp256k1<All>,
    coin_type: CoinType,
    mnemonic: Option<Mnemonic>,
    seed: Option<Seed>,
    root: ExtendedKey,
    account: ExtendedKey,
    bip44_path: DerivationPath,
    bip44_address: String,
}

impl HdWallet {
    /// Build from an integer coin type and an optional hex seed.
    ///
    /// Without a seed a new mnemonic is generated and kept for export.
    pub fn new(coin_type: u32, seed_hex: Option<&str>) -> WalletResult<Self> {
        let coin = CoinType::try_from(coin_type)?;
        Self::from_source(coin, SeedSource::from_seed_hex(seed_hex)?)
    }

    /// Build from a network flag (a coin type from the same registry) and
    /// an optional phrase
    pub fn from_mnemonic(network_flag: u32, mnemonic: Option<&str>) -> WalletResult<Self> {
        let coin = CoinType::try_from(network_flag)?;
        Self::from_source(coin, SeedSource::from_mnemonic(mnemonic))
    }

    /// Import a serialized root key; mainnet keys select Bitcoin and
    /// testnet keys select Bitcoin testnet
    pub fn from_master_priv(xprv: &str) -> WalletResult<Self> {
        let root: ExtendedKey = xprv.parse()?;
        let coin = root.network().bitcoin_coin();
        Self::from_source(coin, SeedSource::master_key(xprv))
    }

    /// Build using the global configuration
    pub fn from_source(coin_type: CoinType, source: SeedSource) -> WalletResult<Self> {
        Self::from_store(coin_type, source, config_store())
    }

    fn from_store(
        coin_type: CoinType,
        source: SeedSource,
        store: &ConfigStore,
    ) -> WalletResult<Self> {
        Self::with_config(coin_type, source, &store.get()?)
    }

    pub fn with_config(
        coin_type: CoinType,
        source: SeedSource,
        config: &WalletConfig,
    ) -> WalletResult<Self> {
        let secp = Secp256k1::new();
        let network = coin_type.network();

        let (mnemonic, seed, root) = match source {
            SeedSource::Explicit(seed) => {
                let root = ExtendedKey::master_key(seed.as_bytes(), network)?;
                (None, Some(seed), root)
            }
            SeedSource::Mnemonic(phrase) => {
                let mnemonic = Mnemonic::parse(&phrase)?;
                let seed = mnemonic.to_seed(config.passphrase());
                let root = ExtendedKey::master_key(seed.as_bytes(), network)?;
                (Some(mnemonic), Some(seed), root)
            }
            SeedSource::Generate => {
                let mnemonic = generate_mnemonic(config.word_count.words())?;
                let seed = mnemonic.to_seed(config.passphrase());
                let root = ExtendedKey::master_key(seed.as_bytes(), network)?;
                (Some(mnemonic), Some(seed), root)
            }
            SeedSource::MasterKey(encoded) => (None, None, import_root(&encoded, network)?),
        };

        let account = root.derive_path(&secp, &DerivationPath::bip44_account(coin_type.index(), 0)?)?;
        let bip44_path = DerivationPath::bip44(coin_type.index(), 0, 0, 0)?;
        let leaf = account
            .derive_child(&secp, 0, false)?
            .derive_child(&secp, 0, false)?;
        let bip44_address = encode_address(&leaf.public_key(&secp), coin_type);

        Ok(Self {
            secp,
            coin_type,
            mnemonic,
            seed,
            root,
            account,
            bip44_path,
            bip44_address,
        })
    }

    // ===== BIP44 =====

    /// Address at `m/44'/coin'/0'/0/0`
    pub fn bip44_address(&self) -> String {
        self.bip44_address.clone()
    }

    pub fn bip44_path(&self) -> &DerivationPath {
        &self.bip44_path
    }

    /// BIP44 leaf node for any account/change/index
    pub fn derive_bip44(&self, account: u32, change: u32, index: u32) -> WalletResult<ExtendedKey> {
        let path = self.path_at(account, change, index)?;
        if account == 0 {
            // reuse the memoized account node
            return self
                .account
                .derive_child(&self.secp, change, false)?
                .derive_child(&self.secp, index, false);
        }
        self.root.derive_path(&self.secp, &path)
    }

    pub fn address_at(&self, account: u32, change: u32, index: u32) -> WalletResult<String> {
        let leaf = self.derive_bip44(account, change, index)?;
        Ok(encode_address(&leaf.public_key(&self.secp), self.coin_type))
    }

    /// Account-level extended public key (`m/44'/coin'/0'`)
    pub fn account_xpub(&self) -> String {
        self.account.neuter(&self.secp).to_string()
    }

    /// Hex private key of the canonical BIP44 leaf
    pub fn bip44_priv_hex(&self) -> WalletResult<String> {
        private_hex(&self.derive_bip44(0, 0, 0)?)
    }

    fn path_at(&self, account: u32, change: u32, index: u32) -> WalletResult<DerivationPath> {
        DerivationPath::bip44(self.coin_type.index(), account, change, index)
    }

    // ===== BIP86 =====

    fn bip86_leaf(&self) -> WalletResult<ExtendedKey> {
        if !self.coin_type.is_bitcoin() {
            return Err(WalletError::unsupported_coin_type(self.coin_type.index())
                .with_details("BIP86 is defined for Bitcoin only"));
        }
        let path = DerivationPath::bip86(self.coin_type.index(), 0, 0, 0)?;
        self.root.derive_path(&self.secp, &path)
    }

    /// Taproot address at `m/86'/coin'/0'/0/0`
    pub fn bip86_address(&self) -> WalletResult<String> {
        let leaf = self.bip86_leaf()?;
        Ok(encode_taproot_address(
            &self.secp,
            &leaf.public_key(&self.secp),
            self.coin_type.network(),
        ))
    }

    pub fn bip86_priv_hex(&self) -> WalletResult<String> {
        private_hex(&self.bip86_leaf()?)
    }

    /// BIP341 output key secret for the BIP86 leaf, committing to an optional
    /// 32-byte script tree merkle root given as hex
    pub fn bip86_tweaked_priv_hex(&self, merkle_root_hex: Option<&str>) -> WalletResult<String> {
        let merkle_root = merkle_root_hex.map(parse_merkle_root).transpose()?;
        let leaf = self.bip86_leaf()?;
        let secret = leaf
            .secret_key()
            .ok_or_else(WalletError::private_key_required)?;

        let keypair = Keypair::from_secret_key(&self.secp, secret);
        let tweaked = keypair.tap_tweak(&self.secp, merkle_root).to_inner();
        let bytes = Zeroizing::new(tweaked.secret_key().secret_bytes());
        Ok(hex::encode(bytes.as_slice()))
    }

    // ===== EVM =====

    fn evm_leaf(&self) -> WalletResult<ExtendedKey> {
        let path = DerivationPath::bip44(CoinType::Ethereum.index(), 0, 0, 0)?;
        self.root.derive_path(&self.secp, &path)
    }

    /// Ethereum address at `m/44'/60'/0'/0/0`, whatever the selected coin
    pub fn evm_address(&self) -> WalletResult<String> {
        let leaf = self.evm_leaf()?;
        Ok(encode_evm_address(&leaf.public_key(&self.secp)))
    }

    pub fn evm_priv_hex(&self) -> WalletResult<String> {
        private_hex(&self.evm_leaf()?)
    }

    // ===== Exports =====

    /// The phrase the wallet was built from, if any
    pub fn export_mnemonic(&self) -> WalletResult<String> {
        self.mnemonic
            .as_ref()
            .map(|m| m.phrase().to_string())
            .ok_or_else(WalletError::mnemonic_unavailable)
    }

    /// BIP32 root as xprv/tprv
    pub fn export_master_priv(&self) -> String {
        self.root.to_string()
    }

    pub fn coin_type(&self) -> CoinType {
        self.coin_type
    }

    pub fn network(&self) -> Network {
        self.coin_type.network()
    }

    pub fn has_mnemonic(&self) -> bool {
        self.mnemonic.is_some()
    }

    pub fn seed_hex(&self) -> Option<String> {
        self.seed.as_ref().map(Seed::to_hex)
    }

    /// Summary of the wallet at a BIP44 position
    pub fn report_at(&self, account: u32, change: u32, index: u32) -> WalletResult<WalletReport> {
        let leaf = self.derive_bip44(account, change, index)?;
        let public_key = leaf.public_key(&self.secp);

        Ok(WalletReport {
            coin_type: self.coin_type.index(),
            network: self.network(),
            mnemonic: self.mnemonic.as_ref().map(|m| m.phrase().to_string()),
            seed_hex: self.seed_hex(),
            master_xprv: self.export_master_priv(),
            path: self.path_at(account, change, index)?.to_string(),
            public_key_hex: hex::encode(public_key.serialize()),
            address: encode_address(&public_key, self.coin_type),
        })
    }
}

impl fmt::Debug for HdWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HdWallet")
            .field("coin_type", &self.coin_type)
            .field("has_mnemonic", &self.has_mnemonic())
            .field("bip44_address", &self.bip44_address)
            .finish_non_exhaustive()
    }
}

fn import_root(encoded: &str, network: Network) -> WalletResult<ExtendedKey> {
    let root: ExtendedKey = encoded.parse()?;
    if !root.is_private() {
        return Err(WalletError::invalid_extended_key("Master key must be private"));
    }
    if root.depth() != 0 {
        return Err(WalletError::invalid_extended_key("Master key must be a root key")
            .with_details(format!("depth {}", root.depth())));
    }
    if root.network() != network {
        return Err(WalletError::invalid_extended_key(format!(
            "Master key is for {}, wallet is for {}",
            root.network(),
            network
        )));
    }
    Ok(root)
}

fn parse_merkle_root(merkle_root_hex: &str) -> WalletResult<TapNodeHash> {
    let bytes: [u8; 32] = hex::decode(merkle_root_hex)
        .ok()
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| WalletError::invalid_input("Merkle root must be 32 bytes of hex"))?;
    Ok(TapNodeHash::from_byte_array(bytes))
}

fn private_hex(node: &ExtendedKey) -> WalletResult<String> {
    node.private_key_bytes()
        .map(|bytes| hex::encode(bytes.as_slice()))
        .ok_or_else(WalletError::private_key_required)
}
