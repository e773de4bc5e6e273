//! Main entry point for the ProofPass command-line client.
//!
//! Issues and verifies residency passes on Filecoin Calibration, and
//! administers the notary and storage provider jurisdiction registries.
//! Every transaction is shown for approval before it is signed unless
//! `--yes` is given.

use clap::Parser;
use proofpass_config::Config;
use proofpass_core::{AutoApprove, TransactionApprover};
use std::path::PathBuf;
use std::sync::Arc;

mod commands;
mod factory_registry;
mod terminal;

use commands::Command;
use factory_registry::build_context_from_config;
use terminal::PromptApprover;

/// Command-line arguments for the ProofPass client.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config/proofpass.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "warn")]
	log_level: String,

	/// Sign transactions without asking
	#[arg(short, long, global = true)]
	yes: bool,

	#[command(subcommand)]
	command: Command,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	// RUST_LOG wins over --log-level
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	let config_path = args
		.config
		.to_str()
		.ok_or_else(|| format!("Invalid config path: {}", args.config.display()))?;
	let config = Config::from_file(config_path).await?;
	tracing::info!(
		network = %config.network.name,
		chain_id = config.network.chain_id,
		"Loaded configuration"
	);

	let approver: Arc<dyn TransactionApprover> = if args.yes {
		Arc::new(AutoApprove)
	} else {
		Arc::new(PromptApprover::stdin(config.network.clone()))
	};

	let context = build_context_from_config(config, approver).await?;
	let result = commands::run(&context, args.command).await;
	context.shutdown().await;
	result
}
