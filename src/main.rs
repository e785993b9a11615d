//! `hdwallet` command line tool
//!
//! Generates and inspects HD wallets from the shell. Reports go to stdout
//! (text or `--json`), logs go to stderr.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use zeroize::Zeroizing;

use hdwallet::utils::config::{set_config, WalletConfig};
use hdwallet::{log_debug, log_info, log_warn};
use hdwallet::{CoinType, HdWallet, Mnemonic, SeedSource, WalletError, WalletReport, WordCount};

#[derive(Parser)]
#[command(
    name = "hdwallet",
    about = "BIP39/BIP32/BIP44 hierarchical deterministic wallet tool",
    version
)]
struct Cli {
    #[arg(long, global = true, help = "print debug logs to stderr")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new mnemonic and its first address
    Generate(GenerateArgs),

    /// Derive an address from a seed, mnemonic or root key
    Address(AddressArgs),

    /// Print the BIP39 seed of a mnemonic
    Seed(SeedArgs),

    /// Check a mnemonic's words and checksum
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long, help = "mnemonic length: 12, 15, 18, 21 or 24")]
    words: Option<usize>,

    #[arg(long, default_value_t = 0, help = "SLIP-44 coin type (0, 1, 2, 3 or 60)")]
    coin: u32,

    #[arg(long, help = "BIP39 passphrase")]
    passphrase: Option<String>,

    #[arg(long, help = "emit a JSON report")]
    json: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct SourceArgs {
    #[arg(long, help = "hex seed of 16 to 64 bytes")]
    seed_hex: Option<String>,

    #[arg(long, help = "BIP39 mnemonic phrase")]
    mnemonic: Option<String>,

    #[arg(long, help = "serialized root key (xprv/tprv)")]
    xprv: Option<String>,
}

#[derive(Args, Debug)]
struct AddressArgs {
    #[arg(long, default_value_t = 0, help = "SLIP-44 coin type (0, 1, 2, 3 or 60)")]
    coin: u32,

    #[command(flatten)]
    source: SourceArgs,

    #[arg(long, help = "BIP39 passphrase, used with --mnemonic")]
    passphrase: Option<String>,

    #[arg(long, help = "BIP44 account (defaults to HDWALLET_ACCOUNT or 0)")]
    account: Option<u32>,

    #[arg(long, default_value_t = 0, help = "0 for receiving, 1 for change")]
    change: u32,

    #[arg(long, default_value_t = 0, help = "address index")]
    index: u32,

    #[arg(long, help = "emit a JSON report")]
    json: bool,
}

#[derive(Args, Debug)]
struct SeedArgs {
    #[arg(long, help = "BIP39 mnemonic phrase")]
    mnemonic: String,

    #[arg(long, default_value = "", help = "BIP39 passphrase")]
    passphrase: String,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    #[arg(long, help = "BIP39 mnemonic phrase")]
    mnemonic: String,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = WalletConfig::from_env().map_err(CliError::from)?;
    config.debug_logging |= cli.debug;
    for warning in set_config(config.clone()).map_err(CliError::from)? {
        log_warn!("cli", warning);
    }
    log_debug!("cli", "Configuration loaded", word_count = config.word_count);

    match cli.command {
        Commands::Generate(args) => generate(args, config)?,
        Commands::Address(args) => address(args, config)?,
        Commands::Seed(args) => seed(args)?,
        Commands::Validate(args) => validate(args)?,
    }
    Ok(())
}

fn generate(args: GenerateArgs, mut config: WalletConfig) -> Result<(), CliError> {
    let coin = CoinType::try_from(args.coin)?;
    if let Some(words) = args.words {
        config.word_count = WordCount::try_from(words)?;
    }
    if let Some(passphrase) = args.passphrase {
        config.passphrase = Zeroizing::new(passphrase);
    }

    let wallet = HdWallet::with_config(coin, SeedSource::Generate, &config)?;
    let report = wallet.report_at(config.default_account, 0, 0)?;
    log_info!("cli", "Wallet generated", coin_type = coin, address = report.address);

    print_report(&report, args.json)
}

fn address(args: AddressArgs, mut config: WalletConfig) -> Result<(), CliError> {
    let coin = CoinType::try_from(args.coin)?;
    if let Some(passphrase) = args.passphrase {
        config.passphrase = Zeroizing::new(passphrase);
    }

    let source = match args.source {
        SourceArgs { seed_hex: Some(hex), .. } => SeedSource::from_seed_hex(Some(&hex))?,
        SourceArgs { mnemonic: Some(phrase), .. } => SeedSource::mnemonic(&phrase),
        SourceArgs { xprv: Some(xprv), .. } => SeedSource::master_key(&xprv),
        // clap enforces exactly one source
        _ => return Err(WalletError::invalid_input("No seed source given").into()),
    };

    let wallet = HdWallet::with_config(coin, source, &config)?;
    let account = args.account.unwrap_or(config.default_account);
    let report = wallet.report_at(account, args.change, args.index)?;
    log_debug!("cli", "Address derived", path = report.path, address = report.address);

    print_report(&report, args.json)
}

fn seed(args: SeedArgs) -> Result<(), CliError> {
    let mnemonic = Mnemonic::parse(&args.mnemonic)?;
    println!("{}", mnemonic.to_seed(&args.passphrase).to_hex());
    Ok(())
}

fn validate(args: ValidateArgs) -> Result<(), CliError> {
    let mnemonic = Mnemonic::parse(&args.mnemonic)?;
    println!("valid ({})", mnemonic.word_count());
    Ok(())
}

fn print_report(report: &WalletReport, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Coin type:  {}", report.coin_type);
    println!("Network:    {}", report.network);
    if let Some(ref mnemonic) = report.mnemonic {
        println!("Mnemonic:   {}", mnemonic);
    }
    println!("Root key:   {}", report.master_xprv);
    println!("Path:       {}", report.path);
    println!("Public key: {}", report.public_key_hex);
    println!("Address:    {}", report.address);
    Ok(())
}
