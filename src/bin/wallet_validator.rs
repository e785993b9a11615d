//! Cross-checks an `hdwallet --json` report against the `bitcoin` crate's
//! own BIP32 implementation.
//!
//! Usage: `hdwallet address ... --json | wallet_validator` or
//! `wallet_validator report.json`.

use std::env;
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::str::FromStr;

use bitcoin::bip32::{DerivationPath, Xpriv, Xpub};
use bitcoin::secp256k1::Secp256k1;
use bitcoin::{Address, NetworkKind, PublicKey};
use hdwallet::{encode_address, CoinType, Network, WalletReport};

struct ValidationResult {
    name: &'static str,
    success: bool,
    message: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();
    let payload = if let Some(path) = args.get(1) {
        fs::read_to_string(path)?
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    };

    let report: WalletReport = serde_json::from_str(&payload)?;

    let results = vec![
        run_validation("Mnemonic", || validate_mnemonic(&report)),
        run_validation("Root key", || validate_root(&report)),
        run_validation("Leaf key", || validate_leaf(&report)),
        run_validation("Address", || validate_address(&report)),
    ];

    println!("================ Wallet Validation ================");
    for result in &results {
        let status = if result.success { "✅ PASS" } else { "❌ FAIL" };
        println!("{:<10} {}", result.name, status);
        if !result.success {
            println!("    {}", result.message);
        }
    }

    let overall_success = results.iter().all(|r| r.success);
    println!("===================================================");
    if overall_success {
        println!("Overall status: ✅ Report verified");
        Ok(())
    } else {
        println!("Overall status: ❌ Validation failed");
        Err("wallet validation failed".into())
    }
}

fn run_validation<F>(name: &'static str, f: F) -> ValidationResult
where
    F: FnOnce() -> Result<(), String>,
{
    match f() {
        Ok(_) => ValidationResult {
            name,
            success: true,
            message: String::new(),
        },
        Err(err) => ValidationResult {
            name,
            success: false,
            message: err,
        },
    }
}

fn network_kind(network: Network) -> NetworkKind {
    match network {
        Network::Mainnet => NetworkKind::Main,
        Network::Testnet => NetworkKind::Test,
    }
}

/// The phrase must parse under the reference BIP39 word list
fn validate_mnemonic(report: &WalletReport) -> Result<(), String> {
    let Some(ref phrase) = report.mnemonic else {
        return Ok(());
    };
    let mnemonic = bip39::Mnemonic::parse_normalized(phrase).map_err(|e| e.to_string())?;
    if mnemonic.to_string() != *phrase {
        return Err("Mnemonic is not in canonical form".to_string());
    }
    Ok(())
}

/// The root key must be the BIP32 master of the reported seed
fn validate_root(report: &WalletReport) -> Result<(), String> {
    let root = Xpriv::from_str(&report.master_xprv).map_err(|e| e.to_string())?;
    if root.network != network_kind(report.network) {
        return Err("Root key network does not match report".to_string());
    }

    let Some(ref seed_hex) = report.seed_hex else {
        return Ok(());
    };
    let seed = hex::decode(seed_hex).map_err(|e| e.to_string())?;
    let expected = Xpriv::new_master(network_kind(report.network), &seed).map_err(|e| e.to_string())?;
    if expected != root {
        return Err("Root key is not the master key of the seed".to_string());
    }
    Ok(())
}

/// The public key must sit at the reported path below the root
fn validate_leaf(report: &WalletReport) -> Result<(), String> {
    let secp = Secp256k1::new();
    let root = Xpriv::from_str(&report.master_xprv).map_err(|e| e.to_string())?;
    let path = DerivationPath::from_str(&report.path).map_err(|e| e.to_string())?;
    let leaf = root.derive_priv(&secp, &path).map_err(|e| e.to_string())?;
    let public = Xpub::from_priv(&secp, &leaf).public_key;

    if hex::encode(public.serialize()) != report.public_key_hex {
        return Err(format!("Public key mismatch at {}", report.path));
    }
    Ok(())
}

/// Bitcoin addresses are re-encoded by the `bitcoin` crate; other coins
/// are checked against the public key in the report
fn validate_address(report: &WalletReport) -> Result<(), String> {
    let coin = CoinType::try_from(report.coin_type).map_err(|e| e.to_string())?;
    let key_bytes = hex::decode(&report.public_key_hex).map_err(|e| e.to_string())?;
    let public = PublicKey::from_slice(&key_bytes).map_err(|e| e.to_string())?;

    let expected = if coin.is_bitcoin() {
        Address::p2pkh(public, network_kind(report.network)).to_string()
    } else {
        encode_address(&public.inner, coin)
    };

    if expected != report.address {
        return Err(format!("Expected {}, report has {}", expected, report.address));
    }
    Ok(())
}
