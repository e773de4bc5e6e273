//! Notary and jurisdiction registry administration.

use super::{print_confirmed, warn_on_wrong_network, CommandResult, JurisdictionCommand, NotaryCommand};
use proofpass_core::{JurisdictionRegistration, ProofPassContext};
use proofpass_types::{without_0x_prefix, Bytes};

pub(super) async fn notary(context: &ProofPassContext, command: NotaryCommand) -> CommandResult {
	let registry = context.notary_registry();
	match command {
		NotaryCommand::Add { address, did } => {
			warn_on_wrong_network(context).await;
			let receipt = registry.add_notary(address, &did).await?;
			println!("Notary {} added", address);
			print_confirmed(context, &receipt);
		},
		NotaryCommand::Remove { address } => {
			warn_on_wrong_network(context).await;
			let receipt = registry.remove_notary(address).await?;
			println!("Notary {} removed", address);
			print_confirmed(context, &receipt);
		},
		NotaryCommand::Check { address } => {
			let registered = registry.is_notary(address).await?;
			println!(
				"{} {} a registered notary",
				address,
				if registered { "is" } else { "is not" }
			);
		},
		NotaryCommand::Count => {
			println!("Registered notaries: {}", registry.notary_count().await?);
		},
	}
	Ok(())
}

pub(super) async fn jurisdiction(
	context: &ProofPassContext,
	command: JurisdictionCommand,
) -> CommandResult {
	let client = context.jurisdiction();
	match command {
		JurisdictionCommand::Check {
			country,
			region,
			provider,
		} => {
			let provider = provider.unwrap_or(context.config().jurisdiction.storage_provider);
			let country = country.to_uppercase();
			let compliant = client.is_sp_compliant(provider, &country, &region).await?;
			println!(
				"Storage provider {} is {}compliant for {}",
				provider,
				if compliant { "" } else { "not " },
				jurisdiction_label(&country, &region)
			);
		},
		JurisdictionCommand::Register {
			country,
			region,
			vc_cid,
			expiry,
			signature,
		} => {
			let signature = parse_signature(&signature)?;
			warn_on_wrong_network(context).await;
			let country = country.to_uppercase();
			let label = jurisdiction_label(&country, &region);
			let receipt = client
				.register(JurisdictionRegistration {
					country,
					region,
					vc_cid,
					expiry,
					signature,
				})
				.await?;
			println!("Registered for {}", label);
			print_confirmed(context, &receipt);
		},
	}
	Ok(())
}

fn jurisdiction_label(country: &str, region: &str) -> String {
	if region.is_empty() {
		country.to_string()
	} else {
		format!("{}/{}", country, region)
	}
}

fn parse_signature(input: &str) -> Result<Bytes, String> {
	hex::decode(without_0x_prefix(input.trim()))
		.map(Bytes::from)
		.map_err(|e| format!("Invalid signature hex: {}", e))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_signature() {
		assert_eq!(parse_signature("0xdeadbeef").unwrap().to_vec(), vec![0xde, 0xad, 0xbe, 0xef]);
		assert_eq!(parse_signature("0102").unwrap().len(), 2);
		assert!(parse_signature("0xzz").is_err());
		assert!(parse_signature("0x123").is_err());
	}

	#[test]
	fn test_jurisdiction_label() {
		assert_eq!(jurisdiction_label("US", ""), "US");
		assert_eq!(jurisdiction_label("US", "CA"), "US/CA");
	}
}
