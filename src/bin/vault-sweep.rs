#![forbid(unsafe_code)]
//! Sweeps the scavenger-hunt vault in a single programmable transaction

use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use vault_sweep::config::{load_config, Config};
use vault_sweep::keystore::KeyRecord;
use vault_sweep::rpc::SuiRpcClient;
use vault_sweep::submit::{self, GasSettings};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./sweep.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Builds, signs and submits the withdrawal transaction
    Run(RunArgs),
    /// Prints the address derived from the key record
    Address {
        /// Key record to read instead of the configured one
        #[arg(long)]
        keypair: Option<PathBuf>,
    },
    /// Writes a new key record
    Keygen {
        #[arg(long, default_value = "keypair.json")]
        out: PathBuf,
    },
}

#[derive(Args, Default)]
struct RunArgs {
    /// Key record to read instead of the configured one
    #[arg(long)]
    keypair: Option<PathBuf>,
    /// Number of create/configure/withdraw chains
    #[arg(long)]
    repetitions: Option<u32>,
    /// Network alias: mainnet, testnet, devnet or localnet
    #[arg(long)]
    network: Option<String>,
    /// Simulate instead of signing and submitting
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => {
            let config = load_config(cli.config.as_deref())?;
            run(config, args).await?;
        }
        Commands::Address { keypair } => {
            let config = load_config(cli.config.as_deref())?;
            let path = keypair.unwrap_or_else(|| config.keystore_path());
            let keypair = KeyRecord::load(&path)?.keypair()?;
            println!("{}", keypair.address());
        }
        Commands::Keygen { out } => {
            let (record, keypair) = KeyRecord::generate()?;
            record.save(&out)?;
            println!("{}", "🔑 New key record written".bright_green());
            println!("   File:    {}", out.display());
            println!("   Address: {}", keypair.address().to_string().bright_white());
            println!(
                "{}",
                "💡 Fund this address from the faucet before running the sweep".yellow()
            );
        }
    }

    Ok(())
}

async fn run(mut config: Config, args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(repetitions) = args.repetitions {
        config.hunt.repetitions = repetitions;
    }
    if let Some(network) = args.network {
        config.network.alias = network;
        config.network.rpc_url = None;
    }
    config.validate()?;

    let settings = config.hunt.settings()?;
    let keypair_path = args.keypair.unwrap_or_else(|| config.keystore_path());
    let keypair = KeyRecord::load(&keypair_path)?.keypair()?;
    let sender = keypair.address();

    let client = SuiRpcClient::new(
        &config.network.rpc_url()?,
        Duration::from_secs(config.network.request_timeout_secs),
    )?;

    println!("{}", "🧭 Vault sweep".bright_cyan().bold());
    println!("   Network:     {} ({})", config.network.alias, client.url());
    println!("   Sender:      {}", sender);
    println!("   Package:     {}", settings.package);
    println!("   Vault:       {}", settings.vault);
    println!("   Repetitions: {}", settings.repetitions);
    println!();

    let data = submit::prepare(&client, &settings, GasSettings::from(&config), sender).await?;

    if args.dry_run {
        let response = submit::dry_run(&client, &data).await?;
        let status = &response.effects.status;
        if status.is_success() {
            println!("{}", "✅ Dry run succeeded".bright_green());
        } else {
            println!(
                "{} {}",
                "❌ Dry run failed:".red().bold(),
                status.error.as_deref().unwrap_or(&status.status)
            );
        }
        if let Some(gas) = &response.effects.gas_used {
            println!("   Net gas: {} MIST", gas.net_gas_usage());
        }
        println!("   Digest:  {}", data.digest()?);
        return Ok(());
    }

    let outcome = submit::sign_and_execute(&client, &data, &keypair).await?;

    println!("{}", serde_json::to_string_pretty(&outcome.raw)?);
    println!();
    println!("{}", "✅ Transaction executed".bright_green().bold());
    match config.network.explorer_tx_url(&outcome.digest) {
        Some(url) => println!("{}", url.bright_white().underline()),
        None => println!(
            "   Digest: {} (no public explorer for {})",
            outcome.digest,
            client.url()
        ),
    }

    Ok(())
}
