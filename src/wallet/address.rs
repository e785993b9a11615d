//! Address Encoder
//!
//! Turns a derived public key into the coin's address string.

use bitcoin::base58;
use bitcoin::secp256k1::{PublicKey, Secp256k1, Verification};
use bitcoin::Address;

use crate::types::{CoinType, Network};
use crate::utils::crypto::{hash160, keccak256, to_checksum_address};

/// Encode the canonical address for a coin.
///
/// Total over valid keys: Base58 coins get P2PKH, Ethereum gets EIP-55.
pub fn encode_address(public_key: &PublicKey, coin_type: CoinType) -> String {
    match coin_type.p2pkh_version() {
        Some(version) => encode_p2pkh(public_key, version),
        None => encode_evm_address(public_key),
    }
}

/// Base58Check(version || HASH160(compressed key))
pub fn encode_p2pkh(public_key: &PublicKey, version: u8) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(version);
    payload.extend_from_slice(&hash160(&public_key.serialize()));
    base58::encode_check(&payload)
}

/// Last 20 bytes of Keccak-256 over the uncompressed key, EIP-55 cased
pub fn encode_evm_address(public_key: &PublicKey) -> String {
    let uncompressed = public_key.serialize_uncompressed();
    // Skip 0x04 prefix
    let hash = keccak256(&uncompressed[1..]);
    to_checksum_address(&hash[12..])
}

/// BIP86 key-path-only Taproot output (`bc1p…` / `tb1p…`)
pub fn encode_taproot_address<C: Verification>(
    secp: &Secp256k1<C>,
    public_key: &PublicKey,
    network: Network,
) -> String {
    let (internal_key, _parity) = public_key.x_only_public_key();
    Address::p2tr(secp, internal_key, None, network.to_bitcoin_network()).to_string()
}
