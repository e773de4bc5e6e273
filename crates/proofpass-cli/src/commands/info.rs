//! Read-only commands.

use super::CommandResult;
use proofpass_core::{ContractsOverview, ProofPassContext};
use proofpass_types::{shorten_address, TransactionRecord};

pub(super) async fn fees(context: &ProofPassContext) -> CommandResult {
	let network = &context.config().network;
	let reader = context.fee_reader();
	println!("Issuance fee:        {}", reader.issuance_fee().await.display(network));
	println!("Freshness check fee: {}", reader.freshness_fee().await.display(network));
	Ok(())
}

pub(super) async fn history(context: &ProofPassContext, clear: bool) -> CommandResult {
	let history = context.history();
	if clear {
		history.clear().await;
		println!("Transaction history cleared");
		return Ok(());
	}

	let records = history.list().await;
	if records.is_empty() {
		println!("No transactions yet");
	}
	for record in &records {
		println!("{}", render_record(record));
	}
	Ok(())
}

fn render_record(record: &TransactionRecord) -> String {
	format!(
		"{:<8} {}  {}",
		record.status.to_string(),
		shorten_address(&record.hash.to_string(), 6),
		record.description
	)
}

pub(super) async fn contracts(context: &ProofPassContext) -> CommandResult {
	let overview = context.contracts_overview().await;
	println!("{}", render_overview(&overview));
	Ok(())
}

fn render_overview(overview: &ContractsOverview) -> String {
	let network = &overview.network;
	let mut lines = vec![format!("{} (Chain ID: {})", network.name, network.chain_id)];
	for contract in &overview.contracts {
		lines.push(String::new());
		lines.push(format!("{}  {}", contract.name, contract.address));
		lines.push(format!("  {}", contract.description));
		lines.push(format!("  {}", contract.explorer_url));
	}
	lines.push(String::new());
	lines.push(format!("Issuance fee:        {}", overview.issuance_fee.display(network)));
	lines.push(format!("Freshness check fee: {}", overview.freshness_fee.display(network)));
	lines.push(format!(
		"Registered notaries: {}",
		overview
			.notary_count
			.map(|count| count.to_string())
			.unwrap_or_else(|| "Unavailable".to_string())
	));
	lines.join("\n")
}

pub(super) async fn network(context: &ProofPassContext) -> CommandResult {
	let status = context.network_status().await;
	match status.current_chain_id {
		None => return Err(format!("{} is not reachable", context.config().network.rpc_url).into()),
		Some(current) if status.is_correct_chain() => {
			println!("Connected to {} (Chain ID: {})", context.config().network.name, current)
		},
		Some(current) => {
			println!("Connected to chain {}", current);
			if let Some(warning) = status.warning() {
				eprintln!("Warning: {}", warning);
			}
		},
	}
	Ok(())
}
