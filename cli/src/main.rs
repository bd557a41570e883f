//! cosmoproof CLI Tool
//!
//! A command-line front end for the CosmoProof stability-proof registry.
//!
//! ## Features
//! - Connect a wallet (local key) to the configured network
//! - Submit snarkjs proofs to the registry and follow them to confirmation
//! - Preview the derived contract call offline
//! - Deploy the Verifier and CosmoProof contracts from Hardhat artifacts
//! - Generate the circuit input payload
//!
//! ## Usage
//! ```bash
//! # Submit a proof (key and RPC from .env / environment)
//! cosmoproof submit --proof proof.json --signals public.json
//!
//! # Show the call arguments without sending anything
//! cosmoproof format-args --proof proof.json --signals public.json
//!
//! # Deploy Verifier, then CosmoProof(verifier)
//! cosmoproof deploy --artifacts artifacts
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use alloy::primitives::{Address, U256};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::*;
use cosmoproof::config::NetworkConfig;
use cosmoproof::deploy::{REGISTRY_CONTRACT, VERIFIER_CONTRACT};
use cosmoproof::payload::{self, StabilityPayload};
use cosmoproof::prelude::*;
use cosmoproof::types::read_json;
use log::error;
use rand::rngs::StdRng;
use rand::SeedableRng;
use regex::Regex;

#[derive(Parser)]
#[command(name = "cosmoproof")]
#[command(about = "CLI tool for CosmoProof stability proofs on Scroll", long_about = None)]
struct Cli {
    #[command(flatten)]
    network: NetworkArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct NetworkArgs {
    /// Config file (default: $COSMOPROOF_CONFIG, then ./cosmoproof.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON-RPC endpoint
    #[arg(long, global = true, env = "SCROLL_RPC_URL")]
    rpc_url: Option<String>,

    /// Expected chain id, checked on connect
    #[arg(long, global = true, env = "CHAIN_ID")]
    chain_id: Option<u64>,

    /// Block explorer base URL
    #[arg(long, global = true, env = "EXPLORER_URL")]
    explorer_url: Option<String>,

    /// Hex private key of the signing account
    #[arg(long, global = true, env = "DEPLOYER_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect the wallet and show the account
    Connect,

    /// Submit proof and public signals to the registry
    Submit {
        /// Path to proof.json
        #[arg(short, long)]
        proof: PathBuf,

        /// Path to public.json
        #[arg(short = 's', long)]
        signals: PathBuf,

        /// Registry address (default: $COSMOPROOF_ADDRESS or config)
        #[arg(short, long)]
        contract: Option<Address>,
    },

    /// Print submitStabilityProof arguments without sending
    FormatArgs {
        /// Path to proof.json
        #[arg(short, long)]
        proof: PathBuf,

        /// Path to public.json
        #[arg(short = 's', long)]
        signals: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Deploy the Verifier and CosmoProof contracts
    Deploy {
        /// Hardhat artifacts directory
        #[arg(short, long, default_value = "artifacts")]
        artifacts: PathBuf,
    },

    /// Generate the circuit input payload
    ExportPayload {
        /// Output file
        #[arg(short, long, default_value = "circuits/input.json")]
        output: PathBuf,

        /// RNG seed for a reproducible sample
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let Cli { network, command } = Cli::parse();

    match command {
        Commands::Connect => {
            connect(&network).await?;
        }

        Commands::Submit { proof, signals, contract } => {
            submit(&network, proof, signals, contract).await?;
        }

        Commands::FormatArgs { proof, signals, output } => {
            format_call_args(&network, &proof, &signals, output.as_deref()).await?;
        }

        Commands::Deploy { artifacts } => {
            if let Err(e) = deploy(&network, &artifacts).await {
                error!("{e:?}");
                eprintln!("{} {e:#}", "Deployment failed:".red().bold());
                std::process::exit(1);
            }
        }

        Commands::ExportPayload { output, seed } => {
            export_payload(&output, seed).await?;
        }
    }

    Ok(())
}

fn load_network(args: &NetworkArgs) -> anyhow::Result<NetworkConfig> {
    let mut network = NetworkConfig::load_from(args.config.as_deref())?;
    if let Some(url) = &args.rpc_url {
        network.rpc_url = url.clone();
    }
    if let Some(url) = &args.explorer_url {
        network.explorer_url = url.clone();
    }
    if let Some(chain_id) = args.chain_id {
        network.chain_id = Some(chain_id);
    }
    Ok(network)
}

/// Validate a secp256k1 private key is 32 bytes of hex
fn validate_private_key(key: &str) -> anyhow::Result<()> {
    let re = Regex::new(r"^(0x)?[0-9a-fA-F]{64}$")?;

    if !re.is_match(key.trim()) {
        anyhow::bail!("Invalid private key. Expected 64 hex characters, optionally 0x-prefixed.");
    }

    Ok(())
}

/// Connect the wallet, reporting the outcome on the status line.
/// `None` leaves the form to report the missing signer.
async fn connect_wallet(network: &NetworkConfig, args: &NetworkArgs) -> Option<Connection> {
    let mut wallet = WalletConnector::new();

    let Some(key) = args.private_key.as_deref() else {
        println!("{} {}", "⚠".yellow(), "No private key. Set DEPLOYER_PRIVATE_KEY or pass --private-key.");
        return None;
    };

    if let Err(e) = validate_private_key(key) {
        println!("  {} {}", "✗".red(), e);
        return None;
    }

    match wallet.connect(network, key).await {
        Ok(connection) => {
            println!("  {} {}", "✓".green(), wallet.label());
            Some(connection)
        }
        Err(e) => {
            println!("  {} {} ({})", "✗".red(), wallet.label(), e.user_message());
            None
        }
    }
}

async fn connect(args: &NetworkArgs) -> anyhow::Result<()> {
    let network = load_network(args)?;
    println!("{} {}...", "Connecting to".cyan(), network.name);
    println!("   RPC URL: {}", network.rpc_url);

    let connection = connect_wallet(&network, args)
        .await
        .context("Connection Failed")?;

    println!("   Account:  {}", connection.address);
    println!("   Chain ID: {}", connection.chain_id);
    println!("   Explorer: {}", network.explorer_address_url(&connection.address));

    Ok(())
}

fn print_status(status: &Status) {
    let line = format!("Status: {status}");
    match status {
        Status::Success(_) => println!("{}", line.green().bold()),
        Status::Error(_) | Status::Failed(_) => println!("{}", line.red().bold()),
        Status::Pending(_) | Status::Sending { .. } => println!("{}", line.yellow()),
        _ => println!("{line}"),
    }
}

async fn submit(
    args: &NetworkArgs,
    proof: PathBuf,
    signals: PathBuf,
    contract: Option<Address>,
) -> anyhow::Result<()> {
    let mut network = load_network(args)?;
    if let Some(address) = contract {
        network.registry_address = address;
    }

    println!("{}", "CosmoProof ZK Submission".cyan().bold());
    println!();

    let mut form = SubmissionForm::new(&network.name);
    print_status(form.status());
    form.select_proof_file(proof);
    form.select_public_file(signals);
    print_status(form.status());

    let submitter = connect_wallet(&network, args)
        .await
        .map(|c| ContractSubmitter::new(network.registry_address, c.provider));

    let status = form.submit(submitter.as_ref(), print_status).await.clone();

    if let Some(link) = form.explorer_link(&network) {
        println!();
        println!("{} {}", "View Transaction on Explorer:".cyan(), link);
    }

    match status {
        Status::Success(_) => Ok(()),
        other => anyhow::bail!("{other}"),
    }
}

fn cast_array(values: &[U256]) -> String {
    let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    format!("[{}]", items.join(","))
}

async fn format_call_args(
    args: &NetworkArgs,
    proof_path: &Path,
    signals_path: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    println!("{}", "Formatting proof for CosmoProof contract...".cyan());

    let proof: ProofJson = read_json(proof_path).await?;
    let signals: PublicSignals = read_json(signals_path).await?;

    if proof.protocol.as_deref().is_some_and(|p| p != "groth16") {
        println!("{}", "Warning: Protocol is not groth16".yellow());
    }
    if proof.curve.as_deref().is_some_and(|c| c != "bn128") {
        println!("{}", "Warning: Curve is not bn128 (BN254)".yellow());
    }

    let call = SubmissionArgs::derive(&proof, &signals)?;
    let output_str = serde_json::to_string_pretty(&call)?;

    if let Some(out_path) = output {
        fs::write(out_path, &output_str)?;
        println!("{} {}", "Saved to:".green(), out_path.display());
    } else {
        println!("{}", output_str);
    }

    let network = load_network(args)?;
    let registry = if network.registry_address.is_zero() {
        "REGISTRY_ADDRESS".to_string()
    } else {
        network.registry_address.to_string()
    };
    let b: Vec<String> = call.b.iter().map(|pair| cast_array(pair)).collect();

    println!();
    println!("{}", "cast command:".cyan().bold());
    println!();
    println!(
        "cast send {registry} \"submitStabilityProof(bytes32,uint256,uint256[2],uint256[2][2],uint256[2],uint256[])\" {} {} \"{}\" \"[{}]\" \"{}\" \"{}\" --rpc-url {} --private-key $DEPLOYER_PRIVATE_KEY",
        call.model_hash,
        call.l_reg,
        cast_array(&call.a),
        b.join(","),
        cast_array(&call.c),
        cast_array(&call.input),
        network.rpc_url,
    );

    Ok(())
}

async fn deploy(args: &NetworkArgs, artifacts: &Path) -> anyhow::Result<()> {
    let network = load_network(args)?;
    println!("{} {}...", "Deploying to".cyan(), network.name);
    println!("   RPC URL: {}", network.rpc_url);
    println!("   Artifacts: {}", artifacts.display());

    let verifier = ContractArtifact::load(artifacts, VERIFIER_CONTRACT)?;
    let registry = ContractArtifact::load(artifacts, REGISTRY_CONTRACT)?;

    let key = args
        .private_key
        .as_deref()
        .context("DEPLOYER_PRIVATE_KEY is not set")?;
    validate_private_key(key)?;

    let connection = WalletConnector::new().connect(&network, key).await?;
    println!("Deploying contracts with the account: {}", connection.address);

    let deployer = ChainDeployer::new(connection.provider, connection.address);
    let deployment = deploy_contracts(&deployer, &verifier, &registry).await?;

    println!();
    println!("{}", "Deployment complete!".green().bold());
    println!("  {VERIFIER_CONTRACT}:   {}", deployment.verifier);
    println!("  {REGISTRY_CONTRACT}: {}", deployment.registry);
    println!("  {}", network.explorer_address_url(&deployment.registry));
    println!();
    println!(
        "{}",
        format!("Submit proofs with: COSMOPROOF_ADDRESS={} cosmoproof submit ...", deployment.registry)
            .yellow()
    );

    Ok(())
}

async fn export_payload(output: &Path, seed: Option<u64>) -> anyhow::Result<()> {
    println!("{}", "Generating stability payload...".cyan());

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let u = payload::sample_u(&mut rng);
    let g_q = payload::sample_g_q(&mut rng);

    let transcript_hash = payload::snarkjs_poseidon(&u)
        .await
        .context("Poseidon transcript hash via snarkjs")?;

    let payload = StabilityPayload::compute(u, g_q, transcript_hash);
    payload.write(output)?;

    println!("{} {}", "Wrote".green(), output.display());
    println!("  transcriptHash: {}", payload.transcript_hash);
    println!("  L_reg_q_claim:  {}", payload.l_reg_q_claim);

    Ok(())
}
