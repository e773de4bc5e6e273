use super::{CommandResult, VerifyArgs};
use chrono::DateTime;
use proofpass_core::verify::{pass_id_from_link, share_link, PASS_ID_PARAM};
use proofpass_core::{ProofPassContext, VerificationReport};
use proofpass_types::{current_timestamp, format_elapsed, FreshnessResult, PassId, U256};

pub(super) async fn run(context: &ProofPassContext, args: VerifyArgs) -> CommandResult {
	let pass_id = match (&args.link, &args.pass_id) {
		(Some(link), _) => pass_id_from_link(link)?
			.ok_or_else(|| format!("The link has no {} parameter", PASS_ID_PARAM))?,
		(None, Some(input)) => input.parse::<PassId>()?,
		(None, None) => return Err("Please enter a pass ID".into()),
	};

	let service = context.verification();
	let report = service.report(pass_id).await?;
	println!("{}", render_report(&report, current_timestamp()));
	println!(
		"Share: {}",
		share_link(&context.config().verification.app_url, &report.pass_id)
	);

	if args.refresh {
		if !report.result.is_valid {
			return Err("Only valid passes can be checked for freshness".into());
		}
		let fee = context.fee_reader().freshness_fee().await;
		println!("Freshness check fee: {}", fee.display(&context.config().network));

		let freshness = service.refresh_freshness(&report.pass_id).await?;
		println!("Storage proof: {}", render_freshness(&freshness, current_timestamp()));
	}
	Ok(())
}

fn render_expiry(expiry: U256) -> String {
	u64::try_from(expiry)
		.ok()
		.and_then(|secs| i64::try_from(secs).ok())
		.and_then(|secs| DateTime::from_timestamp(secs, 0))
		.map(|date| date.format("%Y-%m-%d %H:%M UTC").to_string())
		.unwrap_or_else(|| expiry.to_string())
}

fn render_freshness(freshness: &FreshnessResult, now: u64) -> String {
	let state = if freshness.is_fresh { "Fresh" } else { "Stale" };
	match freshness.seconds_since_check(now) {
		Some(elapsed) => format!("{} (last checked {})", state, format_elapsed(elapsed)),
		None => format!("{} (never checked)", state),
	}
}

fn render_report(report: &VerificationReport, now: u64) -> String {
	let pass = &report.result.pass;
	let mut lines = vec![format!(
		"Pass #{}: {}",
		report.pass_id,
		if report.result.is_valid { "VALID" } else { "INVALID" }
	)];
	lines.push(format!("  Country:       {}", pass.country));
	if !pass.region.is_empty() {
		lines.push(format!("  Region:        {}", pass.region));
	}
	lines.push(format!("  Document CID:  {}", pass.document_cid));
	lines.push(format!("  Metadata CID:  {}", pass.metadata_cid));
	lines.push(format!("  Expires:       {}", render_expiry(pass.expiry)));
	lines.push(format!("  Issuer:        {}", pass.issuer));
	if let Some(freshness) = &report.freshness {
		lines.push(format!("  Storage proof: {}", render_freshness(freshness, now)));
	}
	lines.join("\n")
}
