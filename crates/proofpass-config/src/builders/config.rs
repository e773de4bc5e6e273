//! Configuration builder for tests.
//!
//! Produces a valid [`Config`] backed by in-memory storage without going
//! through TOML.

use crate::{
	AccountConfig, Config, ContractsConfig, DeliveryConfig, IssuanceConfig, JurisdictionConfig,
	QueryConfig, StorageConfig, VerificationConfig,
};
use proofpass_types::{Address, NetworkConfig};
use std::collections::HashMap;

/// Well-known development key (first anvil account).
pub const TEST_PRIVATE_KEY: &str =
	"0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Fluent builder for test configurations.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	chain_id: u64,
	residency_pass: Address,
	with_account: bool,
	min_confirmations: u64,
	max_retries: u32,
	retry_delay_ms: u64,
	refresh_delay_seconds: u64,
	strict_regions: bool,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self {
			chain_id: 314159,
			residency_pass: Address::repeat_byte(0x11),
			with_account: true,
			min_confirmations: 1,
			max_retries: 0,
			retry_delay_ms: 1,
			refresh_delay_seconds: 0,
			strict_regions: false,
		}
	}

	pub fn chain_id(mut self, chain_id: u64) -> Self {
		self.chain_id = chain_id;
		self
	}

	pub fn residency_pass(mut self, address: Address) -> Self {
		self.residency_pass = address;
		self
	}

	/// Leaves the `[account]` section out, i.e. no wallet connected.
	pub fn without_account(mut self) -> Self {
		self.with_account = false;
		self
	}

	pub fn min_confirmations(mut self, confirmations: u64) -> Self {
		self.min_confirmations = confirmations;
		self
	}

	pub fn query_retries(mut self, max_retries: u32, retry_delay_ms: u64) -> Self {
		self.max_retries = max_retries;
		self.retry_delay_ms = retry_delay_ms;
		self
	}

	pub fn refresh_delay_seconds(mut self, seconds: u64) -> Self {
		self.refresh_delay_seconds = seconds;
		self
	}

	pub fn strict_regions(mut self, strict: bool) -> Self {
		self.strict_regions = strict;
		self
	}

	pub fn build(self) -> Config {
		let account = self.with_account.then(|| {
			let mut local = toml::Table::new();
			local.insert(
				"private_key".to_string(),
				toml::Value::String(TEST_PRIVATE_KEY.to_string()),
			);
			AccountConfig {
				primary: "local".to_string(),
				implementations: HashMap::from([("local".to_string(), toml::Value::Table(local))]),
			}
		});

		Config {
			network: NetworkConfig {
				chain_id: self.chain_id,
				..NetworkConfig::default()
			},
			contracts: ContractsConfig {
				residency_pass: self.residency_pass,
				sp_jurisdiction: Address::repeat_byte(0x22),
				notary_registry: Address::repeat_byte(0x33),
			},
			jurisdiction: JurisdictionConfig {
				strict_regions: self.strict_regions,
				..JurisdictionConfig::default()
			},
			account,
			storage: StorageConfig {
				primary: "memory".to_string(),
				implementations: HashMap::from([(
					"memory".to_string(),
					toml::Value::Table(toml::Table::new()),
				)]),
			},
			delivery: DeliveryConfig {
				min_confirmations: self.min_confirmations,
				..DeliveryConfig::default()
			},
			query: QueryConfig {
				max_retries: self.max_retries,
				retry_delay_ms: self.retry_delay_ms,
			},
			issuance: IssuanceConfig::default(),
			verification: VerificationConfig {
				refresh_delay_seconds: self.refresh_delay_seconds,
				..VerificationConfig::default()
			},
		}
	}
}
