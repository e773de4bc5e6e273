//! Builder pattern for constructing the ProofPass context.
//!
//! Composes a [`ProofPassContext`] from the configuration and factory
//! functions for each pluggable component: storage, wallet account and chain
//! delivery. Which implementation is used for each is decided by the
//! `primary` key of its configuration section.

use crate::history::TransactionHistory;
use crate::query::QueryClient;
use crate::submitter::{AutoApprove, TransactionApprover, TransactionSubmitter};
use crate::ProofPassContext;
use proofpass_account::{AccountError, AccountInterface, AccountService};
use proofpass_config::Config;
use proofpass_delivery::{
	ConfirmationPolicy, DeliveryError, DeliveryInterface, DeliveryService,
};
use proofpass_storage::{StorageError, StorageInterface, StorageService};
use proofpass_types::{NetworkConfig, SecretString};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during context construction.
///
/// These errors indicate problems with configuration or missing required components.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Container for the factory functions of every pluggable component.
///
/// Each factory takes the implementation's TOML table (plus, for delivery,
/// the network, the wallet key and the polling policy) and returns the
/// implementation.
pub struct ProofPassFactories<SF, AF, DF> {
	pub storage_factories: HashMap<String, SF>,
	pub account_factories: HashMap<String, AF>,
	pub delivery_factories: HashMap<String, DF>,
}

/// Builder for constructing a [`ProofPassContext`] with pluggable implementations.
pub struct ProofPassBuilder {
	config: Config,
	approver: Arc<dyn TransactionApprover>,
}

impl ProofPassBuilder {
	/// Creates a new builder; transactions are approved automatically unless
	/// an approver is set.
	pub fn new(config: Config) -> Self {
		Self {
			config,
			approver: Arc::new(AutoApprove),
		}
	}

	/// Sets who approves signature requests.
	pub fn with_approver(mut self, approver: Arc<dyn TransactionApprover>) -> Self {
		self.approver = approver;
		self
	}

	/// Builds the context using factories for each component type.
	pub async fn build<SF, AF, DF>(
		self,
		factories: ProofPassFactories<SF, AF, DF>,
	) -> Result<ProofPassContext, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		AF: Fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>,
		DF: Fn(
			&toml::Value,
			&NetworkConfig,
			Option<&SecretString>,
			ConfirmationPolicy,
		) -> Result<Box<dyn DeliveryInterface>, DeliveryError>,
	{
		let storage = Arc::new(self.build_storage(&factories.storage_factories)?);
		let account = self.build_account(&factories.account_factories).await?;

		// Without a wallet the delivery is read-only
		let private_key = account.as_ref().map(|account| account.get_private_key());
		let delivery = Arc::new(self.build_delivery(
			&factories.delivery_factories,
			private_key.as_ref(),
		)?);

		let history = Arc::new(TransactionHistory::new(storage.clone()));
		let query = Arc::new(QueryClient::new(delivery.clone(), self.config.query));
		let submitter = Arc::new(TransactionSubmitter::new(
			delivery.clone(),
			account.clone(),
			self.approver,
			history.clone(),
			self.config.network.chain_id,
		));

		Ok(ProofPassContext {
			config: self.config,
			account,
			delivery,
			query,
			history,
			submitter,
		})
	}

	fn build_storage<SF>(&self, factories: &HashMap<String, SF>) -> Result<StorageService, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
	{
		let primary = &self.config.storage.primary;
		let config = self.config.storage.implementations.get(primary).ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary storage '{}' has no configuration",
				primary
			))
		})?;
		let factory = factories
			.get(primary)
			.ok_or_else(|| BuilderError::MissingComponent(format!("storage '{}'", primary)))?;

		match factory(config) {
			Ok(implementation) => {
				tracing::info!(component = "storage", implementation = %primary, "Loaded");
				Ok(StorageService::new(implementation))
			},
			Err(e) => {
				tracing::error!(
					component = "storage",
					implementation = %primary,
					error = %e,
					"Failed to create storage implementation"
				);
				Err(BuilderError::Config(format!(
					"Failed to create storage implementation '{}': {}",
					primary, e
				)))
			},
		}
	}

	async fn build_account<AF>(
		&self,
		factories: &HashMap<String, AF>,
	) -> Result<Option<Arc<AccountService>>, BuilderError>
	where
		AF: Fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>,
	{
		let Some(account_config) = &self.config.account else {
			tracing::warn!(
				component = "account",
				"No wallet configured, transactions cannot be submitted"
			);
			return Ok(None);
		};

		let primary = &account_config.primary;
		let config = account_config.implementations.get(primary).ok_or_else(|| {
			BuilderError::Config(format!("Primary account '{}' has no configuration", primary))
		})?;
		let factory = factories
			.get(primary)
			.ok_or_else(|| BuilderError::MissingComponent(format!("account '{}'", primary)))?;

		let implementation = factory(config).map_err(|e| {
			tracing::error!(
				component = "account",
				implementation = %primary,
				error = %e,
				"Failed to create account implementation"
			);
			BuilderError::Config(format!(
				"Failed to create account implementation '{}': {}",
				primary, e
			))
		})?;
		let account = AccountService::new(implementation);

		// Fetch the address once so a broken wallet fails at startup
		let address = account.get_address().await.map_err(|e| {
			tracing::error!(component = "account", error = %e, "Failed to get wallet address");
			BuilderError::Config(format!("Failed to get wallet address: {}", e))
		})?;
		tracing::info!(component = "account", implementation = %primary, address = %address, "Loaded");

		Ok(Some(Arc::new(account)))
	}

	fn build_delivery<DF>(
		&self,
		factories: &HashMap<String, DF>,
		private_key: Option<&SecretString>,
	) -> Result<DeliveryService, BuilderError>
	where
		DF: Fn(
			&toml::Value,
			&NetworkConfig,
			Option<&SecretString>,
			ConfirmationPolicy,
		) -> Result<Box<dyn DeliveryInterface>, DeliveryError>,
	{
		let delivery_config = &self.config.delivery;
		let primary = &delivery_config.primary;
		let factory = factories
			.get(primary)
			.ok_or_else(|| BuilderError::MissingComponent(format!("delivery '{}'", primary)))?;

		let empty = toml::Value::Table(toml::Table::new());
		let config = delivery_config.implementations.get(primary).unwrap_or(&empty);
		let policy = ConfirmationPolicy {
			poll_interval: Duration::from_secs(delivery_config.poll_interval_seconds),
			timeout: Duration::from_secs(delivery_config.confirmation_timeout_seconds),
		};

		match factory(config, &self.config.network, private_key, policy) {
			Ok(implementation) => {
				tracing::info!(
					component = "delivery",
					implementation = %primary,
					chain_id = self.config.network.chain_id,
					read_only = private_key.is_none(),
					"Loaded"
				);
				Ok(DeliveryService::new(
					implementation,
					delivery_config.min_confirmations,
				))
			},
			Err(e) => {
				tracing::error!(
					component = "delivery",
					implementation = %primary,
					error = %e,
					"Failed to create delivery implementation"
				);
				Err(BuilderError::Config(format!(
					"Failed to create delivery implementation '{}': {}",
					primary, e
				)))
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proofpass_config::builders::ConfigBuilder;
	use proofpass_delivery::MockDeliveryInterface;
	use proofpass_storage::StorageFactory;
	use proofpass_account::AccountFactory;

	type MockDeliveryFactory = fn(
		&toml::Value,
		&NetworkConfig,
		Option<&SecretString>,
		ConfirmationPolicy,
	) -> Result<Box<dyn DeliveryInterface>, DeliveryError>;

	fn mock_delivery(
		_config: &toml::Value,
		_network: &NetworkConfig,
		_key: Option<&SecretString>,
		_policy: ConfirmationPolicy,
	) -> Result<Box<dyn DeliveryInterface>, DeliveryError> {
		Ok(Box::new(MockDeliveryInterface::new()))
	}

	fn factories() -> ProofPassFactories<StorageFactory, AccountFactory, MockDeliveryFactory> {
		ProofPassFactories {
			storage_factories: proofpass_storage::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			account_factories: proofpass_account::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			delivery_factories: HashMap::from([("http".to_string(), mock_delivery as MockDeliveryFactory)]),
		}
	}

	#[tokio::test]
	async fn test_build_with_wallet() {
		let context = ProofPassBuilder::new(ConfigBuilder::new().build())
			.build(factories())
			.await
			.unwrap();

		assert!(context.account().is_some());
		assert_eq!(
			context.connected_address().await.unwrap().to_string(),
			"0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
		);
		context.shutdown().await;
	}

	#[tokio::test]
	async fn test_build_without_wallet() {
		let context = ProofPassBuilder::new(ConfigBuilder::new().without_account().build())
			.build(factories())
			.await
			.unwrap();
		assert!(context.account().is_none());
	}

	#[tokio::test]
	async fn test_missing_delivery_factory() {
		let mut factories = factories();
		factories.delivery_factories.clear();

		let result = ProofPassBuilder::new(ConfigBuilder::new().build())
			.build(factories)
			.await;
		assert!(matches!(result, Err(BuilderError::MissingComponent(ref c)) if c == "delivery 'http'"));
	}
}
