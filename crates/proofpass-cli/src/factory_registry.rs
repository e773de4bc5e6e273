//! Dynamic factory registry for ProofPass implementations.
//!
//! Collects the factory functions every implementation crate exports and
//! builds the context from the ones the configuration names.

use proofpass_account::AccountFactory;
use proofpass_config::Config;
use proofpass_core::{ProofPassBuilder, ProofPassContext, ProofPassFactories, TransactionApprover};
use proofpass_delivery::DeliveryFactory;
use proofpass_storage::StorageFactory;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Global registry for all implementation factories
pub struct FactoryRegistry {
	pub storage: HashMap<String, StorageFactory>,
	pub account: HashMap<String, AccountFactory>,
	pub delivery: HashMap<String, DeliveryFactory>,
}

impl FactoryRegistry {
	/// Create a new empty registry
	pub fn new() -> Self {
		Self {
			storage: HashMap::new(),
			account: HashMap::new(),
			delivery: HashMap::new(),
		}
	}

	pub fn register_storage(&mut self, name: impl Into<String>, factory: StorageFactory) {
		self.storage.insert(name.into(), factory);
	}

	pub fn register_account(&mut self, name: impl Into<String>, factory: AccountFactory) {
		self.account.insert(name.into(), factory);
	}

	pub fn register_delivery(&mut self, name: impl Into<String>, factory: DeliveryFactory) {
		self.delivery.insert(name.into(), factory);
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// The registry with every built-in implementation registered.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in proofpass_storage::get_all_implementations() {
			tracing::debug!("Registering storage implementation: {}", name);
			registry.register_storage(name, factory);
		}

		for (name, factory) in proofpass_account::get_all_implementations() {
			tracing::debug!("Registering account implementation: {}", name);
			registry.register_account(name, factory);
		}

		for (name, factory) in proofpass_delivery::get_all_implementations() {
			tracing::debug!("Registering delivery implementation: {}", name);
			registry.register_delivery(name, factory);
		}

		registry
	})
}

/// Picks the factory of the configured primary implementation.
macro_rules! select_factory {
	($registry:expr, $registry_field:ident, $primary:expr, $type_name:literal) => {{
		let primary: &str = $primary;
		match $registry.$registry_field.get(primary) {
			Some(factory) => HashMap::from([(primary.to_string(), *factory)]),
			None => {
				let mut available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name,
					primary,
					available.join(", ")
				)
				.into());
			},
		}
	}};
}

/// Builds the context using the registry and the configuration.
pub async fn build_context_from_config(
	config: Config,
	approver: Arc<dyn TransactionApprover>,
) -> Result<ProofPassContext, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let storage_factories = select_factory!(registry, storage, &config.storage.primary, "storage");
	let account_factories = match &config.account {
		Some(account) => select_factory!(registry, account, &account.primary, "account"),
		None => HashMap::new(),
	};
	let delivery_factories =
		select_factory!(registry, delivery, &config.delivery.primary, "delivery");

	let factories = ProofPassFactories {
		storage_factories,
		account_factories,
		delivery_factories,
	};

	Ok(ProofPassBuilder::new(config)
		.with_approver(approver)
		.build(factories)
		.await?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use proofpass_config::builders::ConfigBuilder;
	use proofpass_core::AutoApprove;

	#[test]
	fn test_registry_has_builtin_implementations() {
		let registry = get_registry();
		assert!(registry.storage.contains_key("file"));
		assert!(registry.storage.contains_key("memory"));
		assert!(registry.account.contains_key("local"));
		assert!(registry.delivery.contains_key("http"));
	}

	#[tokio::test]
	async fn test_unknown_storage_is_reported() {
		let mut config = ConfigBuilder::new().build();
		config.storage.primary = "redis".to_string();

		let err = build_context_from_config(config, Arc::new(AutoApprove))
			.await
			.err()
			.map(|e| e.to_string());
		assert_eq!(
			err.as_deref(),
			Some("Unknown storage implementation 'redis'. Available: [file, memory]")
		);
	}

	#[tokio::test]
	async fn test_builds_context_without_network_access() {
		let config = ConfigBuilder::new().build();
		let context = build_context_from_config(config, Arc::new(AutoApprove))
			.await
			.unwrap();
		assert!(context.account().is_some());
		assert_eq!(context.config().network.chain_id, 314159);
	}
}
