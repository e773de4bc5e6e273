use super::{warn_on_wrong_network, CommandResult, IssueArgs};
use proofpass_core::verify::share_link;
use proofpass_core::{Clipboard, IssuanceStep, ProofPassContext};
use std::sync::Arc;

pub(super) async fn run(
	context: &ProofPassContext,
	args: IssueArgs,
	clipboard: Arc<dyn Clipboard>,
) -> CommandResult {
	let config = context.config();
	warn_on_wrong_network(context).await;

	let metadata = tokio::fs::metadata(&args.document)
		.await
		.map_err(|e| format!("Cannot read {}: {}", args.document.display(), e))?;
	if !metadata.is_file() {
		return Err(format!("{} is not a file", args.document.display()).into());
	}
	let name = args
		.document
		.file_name()
		.map(|name| name.to_string_lossy().into_owned())
		.unwrap_or_default();

	let mut flow = context.issuance_flow(clipboard);
	flow.select_document(name, metadata.len())?;
	flow.continue_to_policy()?;

	let country = args
		.country
		.unwrap_or_else(|| config.jurisdiction.default_country.clone());
	flow.select_policy(&country, args.region.as_deref())?;

	if let Some(policy) = flow.policy() {
		match context
			.jurisdiction()
			.is_sp_compliant(
				config.jurisdiction.storage_provider,
				&policy.country,
				&policy.region,
			)
			.await
		{
			Ok(true) => {},
			Ok(false) => eprintln!(
				"Warning: the storage provider is not registered for {}",
				policy.country
			),
			Err(e) => tracing::warn!(error = %e, "Could not check storage provider compliance"),
		}
	}

	let fee = flow.refresh_fee().await.display(&config.network);
	println!("Issuance fee: {}", fee);

	let step = flow.pay().await?.clone();
	match &step {
		IssuanceStep::Issued { pass_id, .. } => {
			println!("Residency pass issued. Pass ID: {}", pass_id);
			println!(
				"Share: {}",
				share_link(&config.verification.app_url, pass_id)
			);
			if args.copy_to.is_some() {
				flow.copy_pass_id()?;
				println!("Pass ID copied");
			}
		},
		IssuanceStep::CompletedWithIssues { .. } => {
			eprintln!(
				"The transaction was confirmed but the pass id could not be read from its receipt. \
				 Check the transaction on the explorer."
			);
		},
		other => return Err(format!("Issuance stopped at the {} step", other.name()).into()),
	}

	if let Some(link) = flow.explorer_link() {
		println!("Transaction: {}", link);
	}
	Ok(())
}
