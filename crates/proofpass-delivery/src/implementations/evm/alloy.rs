//! Alloy-based delivery over HTTP JSON-RPC.
//!
//! With a private key the provider carries an `EthereumWallet` and fills
//! nonce, gas and chain id for submitted transactions; without one it is a
//! read-only provider.

use crate::{ConfirmationPolicy, DeliveryError, DeliveryInterface};
use alloy_network::EthereumWallet;
use alloy_primitives::Bytes;
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::{TransactionReceipt as RpcReceipt, TransactionRequest};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport_http::Http;
use async_trait::async_trait;
use proofpass_types::{
	without_0x_prefix, ConfigSchema, ContractCall, EventLog, Field, FieldType,
	ImplementationRegistry, NetworkConfig, Schema, SecretString, Transaction, TransactionHash,
	TransactionReceipt, ValidationError,
};
use std::sync::Arc;
use std::time::Duration;

type HttpProvider = Arc<dyn Provider<Http<reqwest::Client>> + Send + Sync>;

/// Delivery through a single alloy HTTP provider.
pub struct AlloyDelivery {
	provider: HttpProvider,
	chain_id: u64,
	has_signer: bool,
	policy: ConfirmationPolicy,
}

impl AlloyDelivery {
	/// Builds the provider for `network`. `signer` turns on submission.
	pub fn new(
		network: &NetworkConfig,
		signer: Option<PrivateKeySigner>,
		policy: ConfirmationPolicy,
	) -> Result<Self, DeliveryError> {
		let url = network.rpc_url.parse().map_err(|e| {
			DeliveryError::Configuration(format!("Invalid RPC URL {}: {}", network.rpc_url, e))
		})?;

		let has_signer = signer.is_some();
		let provider: HttpProvider = match signer {
			Some(signer) => {
				let wallet = EthereumWallet::from(signer.with_chain_id(Some(network.chain_id)));
				let provider = ProviderBuilder::new()
					.with_recommended_fillers()
					.wallet(wallet)
					.on_http(url);
				provider.client().set_poll_interval(policy.poll_interval);
				Arc::new(provider)
			},
			None => {
				let provider = ProviderBuilder::new().on_http(url);
				provider.client().set_poll_interval(policy.poll_interval);
				Arc::new(provider)
			},
		};

		Ok(Self {
			provider,
			chain_id: network.chain_id,
			has_signer,
			policy,
		})
	}

	fn convert_receipt(receipt: &RpcReceipt) -> TransactionReceipt {
		let logs = receipt
			.inner
			.logs()
			.iter()
			.map(|log| EventLog {
				address: log.inner.address,
				topics: log.inner.data.topics().to_vec(),
				data: log.inner.data.data.clone(),
			})
			.collect();

		TransactionReceipt {
			hash: TransactionHash(receipt.transaction_hash),
			block_number: receipt.block_number.unwrap_or(0),
			success: receipt.status(),
			logs,
		}
	}
}

/// Confirmations of a transaction mined in `tx_block`, counting the
/// inclusion block as the first. A receipt without a block number is treated
/// as included in `current_block`.
fn confirmations_at(tx_block: Option<u64>, current_block: u64) -> u64 {
	let tx_block = tx_block.unwrap_or(current_block);
	current_block.saturating_sub(tx_block) + 1
}

/// Configuration schema for the alloy delivery.
pub struct AlloyDeliverySchema;

impl ConfigSchema for AlloyDeliverySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(
			vec![],
			vec![Field::new("rpc_url", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(url) if url.starts_with("http://") || url.starts_with("https://") => Ok(()),
					_ => Err("rpc_url must be an http(s) URL".to_string()),
				}
			})],
		)
		.validate(config)
	}
}

#[async_trait]
impl DeliveryInterface for AlloyDelivery {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(AlloyDeliverySchema)
	}

	async fn chain_id(&self) -> Result<u64, DeliveryError> {
		self.provider
			.get_chain_id()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get chain id: {}", e)))
	}

	async fn call(&self, call: &ContractCall) -> Result<Bytes, DeliveryError> {
		let request = TransactionRequest::default()
			.to(call.to)
			.input(call.data.clone().into());

		self.provider
			.call(&request)
			.await
			.map_err(|e| DeliveryError::Network(format!("Call to {} failed: {}", call.to, e)))
	}

	async fn submit(&self, tx: Transaction) -> Result<TransactionHash, DeliveryError> {
		if !self.has_signer {
			return Err(DeliveryError::NoSigner);
		}
		if tx.chain_id != self.chain_id {
			return Err(DeliveryError::TransactionFailed(format!(
				"Transaction targets chain {} but the provider is bound to chain {}",
				tx.chain_id, self.chain_id
			)));
		}

		let request = TransactionRequest::default()
			.to(tx.to)
			.input(tx.data.into())
			.value(tx.value);

		// The wallet filler signs before sending.
		let pending_tx = self
			.provider
			.send_transaction(request)
			.await
			.map_err(|e| DeliveryError::TransactionFailed(e.to_string()))?;

		let hash = TransactionHash(*pending_tx.tx_hash());
		tracing::info!(tx_hash = %hash, chain_id = self.chain_id, "Submitted transaction");
		Ok(hash)
	}

	async fn wait_for_confirmation(
		&self,
		hash: &TransactionHash,
		confirmations: u64,
	) -> Result<TransactionReceipt, DeliveryError> {
		let confirmations = confirmations.max(1);
		let start_time = tokio::time::Instant::now();

		tracing::info!(
			tx_hash = %hash,
			confirmations,
			timeout_seconds = self.policy.timeout.as_secs(),
			"Waiting for confirmation"
		);

		loop {
			if start_time.elapsed() > self.policy.timeout {
				return Err(DeliveryError::Timeout {
					confirmations,
					seconds: self.policy.timeout.as_secs(),
				});
			}

			let receipt = match self.provider.get_transaction_receipt(hash.0).await {
				Ok(Some(receipt)) => receipt,
				Ok(None) => {
					tokio::time::sleep(self.policy.poll_interval).await;
					continue;
				},
				Err(e) => {
					return Err(DeliveryError::Network(format!(
						"Failed to get receipt: {}",
						e
					)))
				},
			};

			let current_block = self.provider.get_block_number().await.map_err(|e| {
				DeliveryError::Network(format!("Failed to get block number: {}", e))
			})?;
			let current_confirmations = confirmations_at(receipt.block_number, current_block);

			if current_confirmations >= confirmations {
				return Ok(Self::convert_receipt(&receipt));
			}

			tracing::debug!(
				tx_hash = %hash,
				remaining = confirmations - current_confirmations,
				"Waiting for more confirmations"
			);
			tokio::time::sleep(self.policy.poll_interval).await;
		}
	}
}

/// Creates an HTTP delivery for `network`.
///
/// # Parameters
/// - `config`: implementation table; `rpc_url` (optional) overrides the network's endpoint
/// - `network`: chain id and default RPC endpoint
/// - `private_key`: signing key of the connected wallet, if any
/// - `policy`: receipt polling interval and timeout
pub fn create_http_delivery(
	config: &toml::Value,
	network: &NetworkConfig,
	private_key: Option<&SecretString>,
	policy: ConfirmationPolicy,
) -> Result<Box<dyn DeliveryInterface>, DeliveryError> {
	AlloyDeliverySchema
		.validate(config)
		.map_err(|e| DeliveryError::Configuration(format!("Invalid configuration: {}", e)))?;

	let mut network = network.clone();
	if let Some(rpc_url) = config.get("rpc_url").and_then(|v| v.as_str()) {
		network.rpc_url = rpc_url.to_string();
	}

	let signer = private_key
		.map(|key| {
			key.with_exposed(|key| {
				without_0x_prefix(key.trim())
					.parse::<PrivateKeySigner>()
					.map_err(|_| DeliveryError::Configuration("Invalid private key format".to_string()))
			})
		})
		.transpose()?;

	Ok(Box::new(AlloyDelivery::new(&network, signer, policy)?))
}

/// Registry for the HTTP/alloy delivery implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = crate::DeliveryFactory;

	fn factory() -> Self::Factory {
		create_http_delivery
	}
}

impl crate::DeliveryRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{Address, U256};

	fn empty() -> toml::Value {
		toml::Value::Table(toml::Table::new())
	}

	#[test]
	fn test_confirmations_count_inclusion_block() {
		assert_eq!(confirmations_at(Some(100), 100), 1);
		assert_eq!(confirmations_at(Some(100), 102), 3);
		assert_eq!(confirmations_at(None, 100), 1);
		// Lagging node reports a head below the receipt's block
		assert_eq!(confirmations_at(Some(100), 99), 1);
	}

	#[test]
	fn test_schema_rejects_bad_rpc_url() {
		let config: toml::Value = toml::from_str("rpc_url = \"ws://localhost:8546\"").unwrap();
		let result = create_http_delivery(
			&config,
			&NetworkConfig::default(),
			None,
			ConfirmationPolicy::default(),
		);
		assert!(matches!(result, Err(DeliveryError::Configuration(_))));
	}

	#[test]
	fn test_invalid_private_key_rejected() {
		let key = SecretString::from("0x1234");
		let result = create_http_delivery(
			&empty(),
			&NetworkConfig::default(),
			Some(&key),
			ConfirmationPolicy::default(),
		);
		assert!(matches!(result, Err(DeliveryError::Configuration(_))));
	}

	#[tokio::test]
	async fn test_read_only_delivery_refuses_submission() {
		let delivery = create_http_delivery(
			&empty(),
			&NetworkConfig::default(),
			None,
			ConfirmationPolicy::default(),
		)
		.unwrap();

		let result = delivery
			.submit(Transaction {
				chain_id: 314159,
				to: Address::repeat_byte(0x11),
				data: Bytes::new(),
				value: U256::ZERO,
			})
			.await;
		assert!(matches!(result, Err(DeliveryError::NoSigner)));
	}
}
