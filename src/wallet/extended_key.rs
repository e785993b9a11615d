//! Extended Keys
//!
//! BIP32 key tree: master key generation, private and public child
//! derivation, and xprv/xpub serialization.
//!
//! SECURITY: HMAC outputs and serialized private payloads are zeroized
//! after use. `Debug` never prints private material.

use std::fmt;
use std::str::FromStr;

use bitcoin::base58;
use bitcoin::secp256k1::{PublicKey, Scalar, Secp256k1, SecretKey, Signing, Verification};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{ErrorCode, WalletError, WalletResult};
use crate::types::Network;
use crate::utils::crypto::hash160;

use super::derivation_path::{ChildNumber, DerivationPath};
use super::seed::{MAX_SEED_LEN, MIN_SEED_LEN};

type HmacSha512 = Hmac<Sha512>;

/// HMAC key for master node generation
const MASTER_HMAC_KEY: &[u8] = b"Bitcoin seed";

/// Serialized extended key length before the Base58Check checksum
const EXTENDED_KEY_LEN: usize = 78;

/// Key held by a node
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum KeyMaterial {
    Private(SecretKey),
    Public(PublicKey),
}

/// A node of the BIP32 key tree.
///
/// Nodes are immutable; every derivation returns a new node.
#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedKey {
    network: Network,
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_number: ChildNumber,
    chain_code: [u8; 32],
    key: KeyMaterial,
}

/// Split an HMAC-SHA512 output into the tweak half and the chain code
fn split_hmac(mac: HmacSha512) -> (Zeroizing<[u8; 32]>, [u8; 32]) {
    let mut output = mac.finalize().into_bytes();
    let mut left = Zeroizing::new([0u8; 32]);
    let mut chain_code = [0u8; 32];
    left.copy_from_slice(&output[..32]);
    chain_code.copy_from_slice(&output[32..]);
    output.as_mut_slice().zeroize();
    (left, chain_code)
}

impl ExtendedKey {
    /// Generate the master node from a 16 to 64 byte seed
    pub fn master_key(seed: &[u8], network: Network) -> WalletResult<Self> {
        if !(MIN_SEED_LEN..=MAX_SEED_LEN).contains(&seed.len()) {
            return Err(WalletError::invalid_seed(format!(
                "Seed must be {} to {} bytes, got {}",
                MIN_SEED_LEN,
                MAX_SEED_LEN,
                seed.len()
            )));
        }

        let mut mac = HmacSha512::new_from_slice(MASTER_HMAC_KEY)
            .map_err(|e| WalletError::internal(e.to_string()))?;
        mac.update(seed);
        let (left, chain_code) = split_hmac(mac);

        let secret = SecretKey::from_slice(left.as_slice())
            .map_err(|_| WalletError::internal("Seed produced an invalid master key"))?;

        Ok(Self {
            network,
            depth: 0,
            parent_fingerprint: [0; 4],
            child_number: ChildNumber::from_value(0),
            chain_code,
            key: KeyMaterial::Private(secret),
        })
    }

    /// Derive a single child.
    ///
    /// If the candidate key is invalid (IL >= n, or a zero/infinite result)
    /// derivation moves on to `index + 1`, as BIP32 prescribes.
    pub fn derive_child<C: Signing + Verification>(
        &self,
        secp: &Secp256k1<C>,
        index: u32,
        hardened: bool,
    ) -> WalletResult<Self> {
        let mut child = ChildNumber::new(index, hardened)?;
        loop {
            if let Some(node) = self.try_derive(secp, child)? {
                return Ok(node);
            }
            child = child
                .next()
                .ok_or_else(|| WalletError::invalid_path("Child index space exhausted"))?;
        }
    }

    fn try_derive<C: Signing + Verification>(
        &self,
        secp: &Secp256k1<C>,
        child: ChildNumber,
    ) -> WalletResult<Option<Self>> {
        let mut mac = HmacSha512::new_from_slice(&self.chain_code)
            .map_err(|e| WalletError::internal(e.to_string()))?;

        match (&self.key, child.is_hardened()) {
            (KeyMaterial::Public(_), true) => return Err(WalletError::private_key_required()),
            (KeyMaterial::Private(secret), true) => {
                let secret_bytes = Zeroizing::new(secret.secret_bytes());
                mac.update(&[0u8]);
                mac.update(secret_bytes.as_slice());
            }
            (_, false) => mac.update(&self.public_key(secp).serialize()),
        }
        mac.update(&child.value().to_be_bytes());

        let (left, chain_code) = split_hmac(mac);
        let tweak = match Scalar::from_be_bytes(*left) {
            Ok(tweak) => tweak,
            Err(_) => return Ok(None),
        };

        let key = match self.key {
            KeyMaterial::Private(secret) => match secret.add_tweak(&tweak) {
                Ok(derived) => KeyMaterial::Private(derived),
                Err(_) => return Ok(None),
            },
            KeyMaterial::Public(public) => match public.add_exp_tweak(secp, &tweak) {
                Ok(derived) => KeyMaterial::Public(derived),
                Err(_) => return Ok(None),
            },
        };

        let depth = self
            .depth
            .checked_add(1)
            .ok_or_else(|| WalletError::invalid_path("Maximum derivation depth exceeded"))?;

        Ok(Some(Self {
            network: self.network,
            depth,
            parent_fingerprint: self.fingerprint(secp),
            child_number: child,
            chain_code,
            key,
        }))
    }

    /// Derive along a full path from this node
    pub fn derive_path<C: Signing + Verification>(
        &self,
        secp: &Secp256k1<C>,
        path: &DerivationPath,
    ) -> WalletResult<Self> {
        let mut node = self.clone();
        for (position, child) in path.iter().enumerate() {
            node = node
                .derive_child(secp, child.index(), child.is_hardened())
                .map_err(|e| match e.code {
                    ErrorCode::PrivateKeyRequired => WalletError::invalid_path(format!(
                        "Hardened segment {} of {} needs a private parent",
                        child, path
                    ))
                    .with_details(format!("segment {}", position + 1)),
                    _ => e,
                })?;
        }
        Ok(node)
    }

    /// Public-only copy of this node
    pub fn neuter<C: Signing>(&self, secp: &Secp256k1<C>) -> Self {
        Self {
            key: KeyMaterial::Public(self.public_key(secp)),
            ..self.clone()
        }
    }

    pub fn public_key<C: Signing>(&self, secp: &Secp256k1<C>) -> PublicKey {
        match self.key {
            KeyMaterial::Private(ref secret) => PublicKey::from_secret_key(secp, secret),
            KeyMaterial::Public(public) => public,
        }
    }

    pub fn secret_key(&self) -> Option<&SecretKey> {
        match self.key {
            KeyMaterial::Private(ref secret) => Some(secret),
            KeyMaterial::Public(_) => None,
        }
    }

    /// Raw 32-byte private key, if this is a private node
    pub fn private_key_bytes(&self) -> Option<Zeroizing<[u8; 32]>> {
        self.secret_key().map(|secret| Zeroizing::new(secret.secret_bytes()))
    }

    /// HASH160 of the compressed public key
    pub fn identifier<C: Signing>(&self, secp: &Secp256k1<C>) -> [u8; 20] {
        hash160(&self.public_key(secp).serialize())
    }

    /// First four bytes of the identifier
    pub fn fingerprint<C: Signing>(&self, secp: &Secp256k1<C>) -> [u8; 4] {
        let id = self.identifier(secp);
        [id[0], id[1], id[2], id[3]]
    }

    pub fn is_private(&self) -> bool {
        matches!(self.key, KeyMaterial::Private(_))
    }

    pub fn key(&self) -> &KeyMaterial {
        &self.key
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.parent_fingerprint
    }

    pub fn child_number(&self) -> ChildNumber {
        self.child_number
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        &self.chain_code
    }

    /// Base58Check xprv/xpub (tprv/tpub on testnet)
    pub fn to_extended_string(&self) -> String {
        let mut data = Zeroizing::new(Vec::with_capacity(EXTENDED_KEY_LEN));

        match self.key {
            KeyMaterial::Private(_) => data.extend_from_slice(&self.network.private_version()),
            KeyMaterial::Public(_) => data.extend_from_slice(&self.network.public_version()),
        }
        data.push(self.depth);
        data.extend_from_slice(&self.parent_fingerprint);
        data.extend_from_slice(&self.child_number.value().to_be_bytes());
        data.extend_from_slice(&self.chain_code);

        match self.key {
            KeyMaterial::Private(ref secret) => {
                data.push(0);
                data.extend_from_slice(&secret.secret_bytes());
            }
            KeyMaterial::Public(ref public) => data.extend_from_slice(&public.serialize()),
        }

        base58::encode_check(&data)
    }
}

impl fmt::Display for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_extended_string())
    }
}

impl fmt::Debug for ExtendedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self.key {
            KeyMaterial::Private(_) => "[REDACTED]".to_string(),
            KeyMaterial::Public(ref public) => public.to_string(),
        };
        f.debug_struct("ExtendedKey")
            .field("network", &self.network)
            .field("depth", &self.depth)
            .field("parent_fingerprint", &hex::encode(self.parent_fingerprint))
            .field("child_number", &self.child_number)
            .field("key", &key)
            .finish()
    }
}

impl FromStr for ExtendedKey {
    type Err = WalletError;

    fn from_str(s: &str) -> WalletResult<Self> {
        let data = Zeroizing::new(base58::decode_check(s.trim())?);
        if data.len() != EXTENDED_KEY_LEN {
            return Err(WalletError::invalid_extended_key(format!(
                "Extended key payload must be {} bytes, got {}",
                EXTENDED_KEY_LEN,
                data.len()
            )));
        }

        let mut version = [0u8; 4];
        version.copy_from_slice(&data[0..4]);
        let (network, private) = match version {
            Network::XPRV_MAINNET => (Network::Mainnet, true),
            Network::XPUB_MAINNET => (Network::Mainnet, false),
            Network::XPRV_TESTNET => (Network::Testnet, true),
            Network::XPUB_TESTNET => (Network::Testnet, false),
            _ => {
                return Err(WalletError::invalid_extended_key("Unknown extended key version")
                    .with_details(hex::encode(version)))
            }
        };

        let depth = data[4];
        let mut parent_fingerprint = [0u8; 4];
        parent_fingerprint.copy_from_slice(&data[5..9]);
        let mut child_bytes = [0u8; 4];
        child_bytes.copy_from_slice(&data[9..13]);
        let child_number = ChildNumber::from_value(u32::from_be_bytes(child_bytes));
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&data[13..45]);

        if depth == 0 && (parent_fingerprint != [0; 4] || child_number.value() != 0) {
            return Err(WalletError::invalid_extended_key(
                "Root key has a parent fingerprint or child number",
            ));
        }

        let key = if private {
            if data[45] != 0 {
                return Err(WalletError::invalid_extended_key("Private key must be prefixed with 0x00"));
            }
            let secret = SecretKey::from_slice(&data[46..78])
                .map_err(|_| WalletError::invalid_extended_key("Private key is out of range"))?;
            KeyMaterial::Private(secret)
        } else {
            let public = PublicKey::from_slice(&data[45..78])
                .map_err(|_| WalletError::invalid_extended_key("Public key is not a valid point"))?;
            KeyMaterial::Public(public)
        };

        Ok(Self {
            network,
            depth,
            parent_fingerprint,
            child_number,
            chain_code,
            key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::bip32::{self, Xpriv};

    const TV1_SEED: &str = "000102030405060708090a0b0c0d0e0f";

    fn tv1_master() -> ExtendedKey {
        ExtendedKey::master_key(&hex::decode(TV1_SEED).unwrap(), Network::Mainnet).unwrap()
    }

    #[test]
    fn test_vector_1_chain() {
        let secp = Secp256k1::new();
        let master = tv1_master();

        let expected = [
            (
                "m",
                "xprv9s21ZrQH143K3QTDL4LXw2F7HEK3wJUD2nW2nRk4stbPy6cq3jPPqjiChkVvvNKmPGJxWUtg6LnF5kejMRNNU3TGtRBeJgk33yuGBxrMPHi",
                "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8",
            ),
            (
                "m/0H",
                "xprv9uHRZZhk6KAJC1avXpDAp4MDc3sQKNxDiPvvkX8Br5ngLNv1TxvUxt4cV1rGL5hj6KCesnDYUhd7oWgT11eZG7XnxHrnYeSvkzY7d2bhkJ7",
                "xpub68Gmy5EdvgibQVfPdqkBBCHxA5htiqg55crXYuXoQRKfDBFA1WEjWgP6LHhwBZeNK1VTsfTFUHCdrfp1bgwQ9xv5ski8PX9rL2dZXvgGDnw",
            ),
            (
                "m/0H/1",
                "xprv9wTYmMFdV23N2TdNG573QoEsfRrWKQgWeibmLntzniatZvR9BmLnvSxqu53Kw1UmYPxLgboyZQaXwTCg8MSY3H2EU4pWcQDnRnrVA1xe8fs",
                "xpub6ASuArnXKPbfEwhqN6e3mwBcDTgzisQN1wXN9BJcM47sSikHjJf3UFHKkNAWbWMiGj7Wf5uMash7SyYq527Hqck2AxYysAA7xmALppuCkwQ",
            ),
            (
                "m/0H/1/2H",
                "xprv9z4pot5VBttmtdRTWfWQmoH1taj2axGVzFqSb8C9xaxKymcFzXBDptWmT7FwuEzG3ryjH4ktypQSAewRiNMjANTtpgP4mLTj34bhnZX7UiM",
                "xpub6D4BDPcP2GT577Vvch3R8wDkScZWzQzMMUm3PWbmWvVJrZwQY4VUNgqFJPMM3No2dFDFGTsxxpG5uJh7n7epu4trkrX7x7DogT5Uv6fcLW5",
            ),
            (
                "m/0H/1/2H/2",
                "xprvA2JDeKCSNNZky6uBCviVfJSKyQ1mDYahRjijr5idH2WwLsEd4Hsb2Tyh8RfQMuPh7f7RtyzTtdrbdqqsunu5Mm3wDvUAKRHSC34sJ7in334",
                "xpub6FHa3pjLCk84BayeJxFW2SP4XRrFd1JYnxeLeU8EqN3vDfZmbqBqaGJAyiLjTAwm6ZLRQUMv1ZACTj37sR62cfN7fe5JnJ7dh8zL4fiyLHV",
            ),
            (
                "m/0H/1/2H/2/1000000000",
                "xprvA41z7zogVVwxVSgdKUHDy1SKmdb533PjDz7J6N6mV6uS3ze1ai8FHa8kmHScGpWmj4WggLyQjgPie1rFSruoUihUZREPSL39UNdE3BBDu76",
                "xpub6H1LXWLaKsWFhvm6RVpEL9P4KfRZSW7abD2ttkWP3SSQvnyA8FSVqNTEcYFgJS2UaFcxupHiYkro49S8yGasTvXEYBVPamhGW6cFJodrTHy",
            ),
        ];

        for (path, xprv, xpub) in expected {
            let node = master.derive_path(&secp, &path.parse().unwrap()).unwrap();
            assert_eq!(node.to_string(), xprv, "xprv at {}", path);
            assert_eq!(node.neuter(&secp).to_string(), xpub, "xpub at {}", path);
        }
    }

    #[test]
    fn test_public_derivation_matches_private() {
        let secp = Secp256k1::new();
        let account = tv1_master()
            .derive_path(&secp, &"m/44'/0'/0'".parse().unwrap())
            .unwrap();

        let from_private = account.derive_child(&secp, 5, false).unwrap().neuter(&secp);
        let from_public = account.neuter(&secp).derive_child(&secp, 5, false).unwrap();
        assert_eq!(from_private, from_public);
    }

    #[test]
    fn test_hardened_from_public_fails() {
        let secp = Secp256k1::new();
        let public = tv1_master().neuter(&secp);

        let err = public.derive_child(&secp, 0, true).unwrap_err();
        assert_eq!(err.code, ErrorCode::PrivateKeyRequired);

        let err = public
            .derive_path(&secp, &"m/0/1'".parse().unwrap())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPath);
        assert_eq!(err.details.as_deref(), Some("segment 2"));
    }

    #[test]
    fn test_index_out_of_range() {
        let secp = Secp256k1::new();
        let err = tv1_master()
            .derive_child(&secp, 0x8000_0000, false)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPath);
    }

    #[test]
    fn test_parse_round_trip() {
        let secp = Secp256k1::new();
        let node = tv1_master()
            .derive_path(&secp, &"m/0H/1".parse().unwrap())
            .unwrap();

        let parsed: ExtendedKey = node.to_string().parse().unwrap();
        assert_eq!(parsed, node);

        let public: ExtendedKey = node.neuter(&secp).to_string().parse().unwrap();
        assert!(!public.is_private());
        assert_eq!(public.depth(), 2);
        assert_eq!(public.parent_fingerprint(), node.parent_fingerprint());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = "xprv-not-base58".parse::<ExtendedKey>().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidExtendedKey);

        // valid Base58Check, wrong payload length
        let short = base58::encode_check(&[0x04, 0x88, 0xAD, 0xE4]);
        let err = short.parse::<ExtendedKey>().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidExtendedKey);
    }

    #[test]
    fn test_testnet_versions() {
        let master = ExtendedKey::master_key(&hex::decode(TV1_SEED).unwrap(), Network::Testnet).unwrap();
        assert!(master.to_string().starts_with("tprv"));
        let secp = Secp256k1::new();
        assert!(master.neuter(&secp).to_string().starts_with("tpub"));
    }

    #[test]
    fn test_seed_length_checked() {
        let err = ExtendedKey::master_key(&[0u8; 8], Network::Mainnet).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidSeedEncoding);
    }

    #[test]
    fn test_matches_bitcoin_crate() {
        let secp = Secp256k1::new();
        let seed = [0x5au8; 64];
        let path = "m/44'/60'/0'/0/3";

        let ours = ExtendedKey::master_key(&seed, Network::Mainnet)
            .unwrap()
            .derive_path(&secp, &path.parse().unwrap())
            .unwrap();

        let reference = Xpriv::new_master(bitcoin::Network::Bitcoin, &seed)
            .unwrap()
            .derive_priv(&secp, &path.parse::<bip32::DerivationPath>().unwrap())
            .unwrap();

        assert_eq!(ours.to_string(), reference.to_string());
    }
}
