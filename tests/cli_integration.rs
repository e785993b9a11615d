use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::str::FromStr;

use bitcoin::bip32::{DerivationPath, Xpriv};
use bitcoin::secp256k1::Secp256k1;
use bitcoin::{Address, NetworkKind, PublicKey};
use hdwallet::{Network, WalletReport};

const GOLDEN_SEED: &str = "92ff6cd1fc51db4fd09d4204750c3e72a117488ce893d08811833ecca502e333d149ead97d80f7cb5f347ba9cf5cecb4745cd7dcd4c6dd8d528997086f445a3c";
const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

fn hdwallet(args: &[&str]) -> Output {
    let binary_path = assert_cmd::cargo::cargo_bin!("hdwallet");
    Command::new(binary_path)
        .args(args)
        .env_remove("HDWALLET_WORD_COUNT")
        .env_remove("HDWALLET_PASSPHRASE")
        .env_remove("HDWALLET_ACCOUNT")
        .env_remove("HDWALLET_DEBUG")
        .output()
        .expect("cli run succeeds")
}

fn report_from(args: &[&str]) -> WalletReport {
    let output = hdwallet(args);
    assert!(
        output.status.success(),
        "cli exited unsuccessfully: {:?}",
        output
    );
    let stdout = String::from_utf8(output.stdout).expect("stdout is utf8");
    serde_json::from_str(&stdout).expect("json matches WalletReport schema")
}

#[test]
fn address_from_seed_matches_bitcoin_crate() {
    let report = report_from(&["address", "--coin", "0", "--seed-hex", GOLDEN_SEED, "--json"]);

    assert_eq!(report.coin_type, 0);
    assert_eq!(report.network, Network::Mainnet);
    assert_eq!(report.path, "m/44'/0'/0'/0/0");
    assert_eq!(report.address, "1Krez4p1piwA1a5VLdbPNmSFubbRg3kV6W");
    assert!(report.mnemonic.is_none());

    let secp = Secp256k1::new();
    let seed = hex::decode(GOLDEN_SEED).expect("seed hex");
    let root = Xpriv::new_master(NetworkKind::Main, &seed).expect("master key");
    assert_eq!(root.to_string(), report.master_xprv, "root key matches");

    let leaf = root
        .derive_priv(&secp, &DerivationPath::from_str(&report.path).expect("path"))
        .expect("derives");
    let public = PublicKey::new(leaf.private_key.public_key(&secp));
    assert_eq!(public.to_string(), report.public_key_hex, "public key matches");
    assert_eq!(
        Address::p2pkh(public, NetworkKind::Main).to_string(),
        report.address,
        "address matches"
    );
}

#[test]
fn address_honors_account_change_and_index() {
    let report = report_from(&[
        "address", "--seed-hex", GOLDEN_SEED, "--change", "1", "--json",
    ]);
    assert_eq!(report.path, "m/44'/0'/0'/1/0");
    assert_eq!(report.address, "1LVmZYk7QfVD7qtZo1Pq9g46xCiWf6k9Vg");

    let report = report_from(&["address", "--seed-hex", GOLDEN_SEED, "--index", "1", "--json"]);
    assert_eq!(report.address, "1DdM6zU7K75zM4WE1FDNdEDa2Tgr7Bqbm4");
}

#[test]
fn address_covers_every_registered_coin() {
    let expected = [
        ("1", "mzZfFbnQ7VFtXotgM9Rp2vtMMJxdu9pgbr"),
        ("2", "LazJRasPVjfeW7WFaPnU65ESMDCTrVGLGs"),
        ("3", "DBXUijNG1S1ST6kZDG6HVcSCgxJqjFwTfg"),
        ("60", "0x7fE5C700536ecC0f883BeAC60212960A94080D25"),
    ];
    for (coin, address) in expected {
        let report = report_from(&["address", "--coin", coin, "--seed-hex", GOLDEN_SEED, "--json"]);
        assert_eq!(report.address, address, "coin {}", coin);
    }
}

#[test]
fn generated_wallet_restores_from_its_mnemonic() {
    let generated = report_from(&["generate", "--coin", "1", "--words", "24", "--json"]);
    assert_eq!(generated.network, Network::Testnet);
    assert!(generated.master_xprv.starts_with("tprv"));
    assert!(
        generated.address.starts_with('m') || generated.address.starts_with('n'),
        "testnet address: {}",
        generated.address
    );

    let phrase = generated.mnemonic.clone().expect("generate reports the mnemonic");
    assert_eq!(phrase.split_whitespace().count(), 24);

    let restored = report_from(&["address", "--coin", "1", "--mnemonic", &phrase, "--json"]);
    assert_eq!(restored.address, generated.address);
    assert_eq!(restored.master_xprv, generated.master_xprv);
}

#[test]
fn passphrase_changes_the_wallet() {
    let plain = report_from(&["address", "--mnemonic", ABANDON_ABOUT, "--json"]);
    assert_eq!(plain.address, "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA");

    let salted = report_from(&[
        "address", "--mnemonic", ABANDON_ABOUT, "--passphrase", "TREZOR", "--json",
    ]);
    assert_ne!(salted.address, plain.address);
}

#[test]
fn address_rejects_multiple_sources() {
    let output = hdwallet(&["address", "--seed-hex", GOLDEN_SEED, "--mnemonic", ABANDON_ABOUT]);
    assert!(!output.status.success());
}

#[test]
fn address_rejects_unknown_coin() {
    let output = hdwallet(&["address", "--coin", "501", "--seed-hex", GOLDEN_SEED]);
    assert!(!output.status.success());
}

#[test]
fn seed_prints_bip39_seed() {
    let output = hdwallet(&["seed", "--mnemonic", ABANDON_ABOUT]);
    assert!(output.status.success(), "{:?}", output);
    let stdout = String::from_utf8(output.stdout).expect("stdout is utf8");
    assert_eq!(
        stdout.trim(),
        "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc19a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
    );
}

#[test]
fn validate_accepts_good_and_rejects_bad_checksum() {
    let output = hdwallet(&["validate", "--mnemonic", ABANDON_ABOUT]);
    assert!(output.status.success(), "{:?}", output);
    let stdout = String::from_utf8(output.stdout).expect("stdout is utf8");
    assert!(stdout.contains("valid"));

    let bad = vec!["abandon"; 12].join(" ");
    let output = hdwallet(&["validate", "--mnemonic", &bad]);
    assert!(!output.status.success());
}

#[test]
fn validator_accepts_cli_report() {
    let output = hdwallet(&["generate", "--json"]);
    assert!(output.status.success(), "{:?}", output);

    let validator_path = assert_cmd::cargo::cargo_bin!("wallet_validator");
    let mut child = Command::new(validator_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("validator starts");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(&output.stdout)
        .expect("report written");

    let result = child.wait_with_output().expect("validator finishes");
    assert!(result.status.success(), "{:?}", result);
}

#[test]
fn validator_rejects_tampered_report() {
    let mut report = report_from(&["address", "--seed-hex", GOLDEN_SEED, "--json"]);
    report.address = "1DdM6zU7K75zM4WE1FDNdEDa2Tgr7Bqbm4".to_string();

    let validator_path = assert_cmd::cargo::cargo_bin!("wallet_validator");
    let mut child = Command::new(validator_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("validator starts");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(serde_json::to_string(&report).expect("json").as_bytes())
        .expect("report written");

    let result = child.wait_with_output().expect("validator finishes");
    assert!(!result.status.success());
}
