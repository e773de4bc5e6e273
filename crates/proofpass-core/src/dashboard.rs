//! Read-only overview of the deployed contracts.

use crate::fees::{FeeReader, FeeState};
use crate::query::QueryClient;
use proofpass_config::Config;
use proofpass_types::contracts::INotaryRegistry;
use proofpass_types::{Address, NetworkConfig, U256};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractEntry {
	pub name: &'static str,
	pub description: &'static str,
	pub address: Address,
	pub explorer_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractsOverview {
	pub network: NetworkConfig,
	pub contracts: Vec<ContractEntry>,
	pub issuance_fee: FeeState,
	pub freshness_fee: FeeState,
	/// `None` when the registry could not be read.
	pub notary_count: Option<U256>,
}

fn entry(
	network: &NetworkConfig,
	name: &'static str,
	description: &'static str,
	address: Address,
) -> ContractEntry {
	ContractEntry {
		name,
		description,
		address,
		explorer_url: network.explorer_address_url(&address.to_string()),
	}
}

/// Addresses from the configuration plus live fees and notary count.
pub async fn contracts_overview(config: &Config, query: Arc<QueryClient>) -> ContractsOverview {
	let network = &config.network;
	let contracts = vec![
		entry(
			network,
			"NotaryRegistry",
			"Manages trusted notary signatures and attestation validation",
			config.contracts.notary_registry,
		),
		entry(
			network,
			"SPJurisdiction",
			"Storage Provider jurisdiction compliance and verification registry",
			config.contracts.sp_jurisdiction,
		),
		entry(
			network,
			"ResidencyPass",
			"Soulbound NFT residency passes with PDP verification integration",
			config.contracts.residency_pass,
		),
	];

	let fees = FeeReader::new(query.clone(), config.contracts.residency_pass);
	let notary_count = query
		.read(config.contracts.notary_registry, &INotaryRegistry::getNotaryCountCall {})
		.await
		.map(|ret| ret.count)
		.ok();

	ContractsOverview {
		network: network.clone(),
		contracts,
		issuance_fee: fees.issuance_fee().await,
		freshness_fee: fees.freshness_fee().await,
		notary_count,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{config, query_client, reads};
	use proofpass_delivery::MockDeliveryInterface;

	#[tokio::test]
	async fn test_overview() {
		let mut mock = MockDeliveryInterface::new();
		reads(&mut mock)
			.issuance_fee(U256::from(5))
			.freshness_fee(U256::from(1))
			.notary(false, 2);

		let overview = contracts_overview(&config(), query_client(mock)).await;
		assert_eq!(overview.contracts.len(), 3);
		assert_eq!(overview.contracts[2].name, "ResidencyPass");
		assert_eq!(
			overview.contracts[2].explorer_url,
			format!(
				"https://calibration.filfox.info/en/address/{}",
				Address::repeat_byte(0x11)
			)
		);
		assert_eq!(overview.issuance_fee, FeeState::Ready(U256::from(5)));
		assert_eq!(overview.freshness_fee, FeeState::Ready(U256::from(1)));
		assert_eq!(overview.notary_count, Some(U256::from(2)));
	}
}
