//! Subcommands of the `proofpass` binary.

use clap::{Args, Subcommand};
use proofpass_core::{Clipboard, ProofPassContext};
use proofpass_types::{Address, TransactionReceipt};
use std::path::PathBuf;
use std::sync::Arc;

mod admin;
mod info;
mod issue;
mod verify;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Issue a residency pass for the connected wallet
	Issue(IssueArgs),
	/// Verify a residency pass
	Verify(VerifyArgs),
	/// Show the issuance and freshness check fees
	Fee,
	/// Notary registry administration
	#[command(subcommand)]
	Notary(NotaryCommand),
	/// Storage provider jurisdiction registry
	#[command(subcommand)]
	Jurisdiction(JurisdictionCommand),
	/// Show the local transaction history
	History {
		/// Delete every record
		#[arg(long)]
		clear: bool,
	},
	/// Show the deployed contracts
	Contracts,
	/// Check that the RPC endpoint is on the expected chain
	Network,
}

#[derive(Args, Debug)]
pub struct IssueArgs {
	/// Residency document; only its name and size are used
	pub document: PathBuf,

	/// Country code, one of the configured countries
	#[arg(long)]
	pub country: Option<String>,

	/// Region within the country
	#[arg(long)]
	pub region: Option<String>,

	/// File that receives the new pass id
	#[arg(long)]
	pub copy_to: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
	/// Pass id as typed by the user
	#[arg(conflicts_with = "link", required_unless_present = "link")]
	pub pass_id: Option<String>,

	/// Verification link carrying a passId parameter
	#[arg(long)]
	pub link: Option<String>,

	/// Pay for a storage proof check and read the freshness again
	#[arg(long)]
	pub refresh: bool,
}

#[derive(Subcommand, Debug)]
pub enum NotaryCommand {
	/// Register a notary
	Add { address: Address, did: String },
	/// Remove a notary
	Remove { address: Address },
	/// Check whether an address is a registered notary
	Check { address: Address },
	/// Number of registered notaries
	Count,
}

#[derive(Subcommand, Debug)]
pub enum JurisdictionCommand {
	/// Check a storage provider's compliance for a jurisdiction
	Check {
		country: String,
		#[arg(default_value = "")]
		region: String,
		/// Storage provider, defaults to the configured one
		#[arg(long)]
		provider: Option<Address>,
	},
	/// Register the connected account for a jurisdiction
	Register {
		country: String,
		region: String,
		vc_cid: String,
		/// Unix timestamp
		expiry: u64,
		/// Hex encoded signature over the credential
		signature: String,
	},
}

/// Runs one command against the context.
pub async fn run(context: &ProofPassContext, command: Command) -> CommandResult {
	match command {
		Command::Issue(args) => {
			let clipboard: Arc<dyn Clipboard> = match &args.copy_to {
				Some(path) => Arc::new(crate::terminal::FileClipboard::new(path)),
				None => Arc::new(crate::terminal::NoClipboard),
			};
			issue::run(context, args, clipboard).await
		},
		Command::Verify(args) => verify::run(context, args).await,
		Command::Fee => info::fees(context).await,
		Command::Notary(command) => admin::notary(context, command).await,
		Command::Jurisdiction(command) => admin::jurisdiction(context, command).await,
		Command::History { clear } => info::history(context, clear).await,
		Command::Contracts => info::contracts(context).await,
		Command::Network => info::network(context).await,
	}
}

/// Prints where a confirmed transaction can be looked up.
fn print_confirmed(context: &ProofPassContext, receipt: &TransactionReceipt) {
	println!(
		"Confirmed in block {}: {}",
		receipt.block_number,
		context
			.config()
			.network
			.explorer_tx_url(&receipt.hash.to_string())
	);
}

/// Prints the wrong-network advisory, if any.
async fn warn_on_wrong_network(context: &ProofPassContext) {
	if let Some(warning) = context.network_status().await.warning() {
		eprintln!("Warning: {}", warning);
	}
}
