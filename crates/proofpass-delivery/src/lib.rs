//! Chain transport for the ProofPass client.
//!
//! Delivery covers everything that talks to the RPC endpoint: read-only
//! contract calls, transaction submission through the connected wallet and
//! waiting for receipts. Higher layers decide what to call and how to
//! interpret the result.

use async_trait::async_trait;
use proofpass_types::{
	Bytes, ConfigSchema, ContractCall, ImplementationRegistry, NetworkConfig, SecretString,
	Transaction, TransactionHash, TransactionReceipt,
};
use std::time::Duration;
use thiserror::Error;

pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

/// Errors that can occur during transaction delivery operations.
#[derive(Debug, Error)]
pub enum DeliveryError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// The node refused the transaction or its submission failed.
	#[error("Transaction failed: {0}")]
	TransactionFailed(String),
	/// Submission was attempted without a signing key.
	#[error("No wallet connected")]
	NoSigner,
	/// The receipt did not reach the required confirmations in time.
	#[error("Timeout waiting for {confirmations} confirmations after {seconds} seconds")]
	Timeout { confirmations: u64, seconds: u64 },
	/// The implementation's configuration was rejected.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Receipt polling policy shared by all implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
	pub poll_interval: Duration,
	pub timeout: Duration,
}

impl Default for ConfirmationPolicy {
	fn default() -> Self {
		Self {
			poll_interval: Duration::from_secs(7),
			timeout: Duration::from_secs(600),
		}
	}
}

/// Interface for chain transports.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DeliveryInterface: Send + Sync {
	/// Schema used to validate this implementation's TOML table.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Chain id reported by the RPC endpoint.
	async fn chain_id(&self) -> Result<u64, DeliveryError>;

	/// Executes a read-only call and returns the raw return data.
	async fn call(&self, call: &ContractCall) -> Result<Bytes, DeliveryError>;

	/// Signs and submits a transaction, returning its hash once the node accepted it.
	async fn submit(&self, tx: Transaction) -> Result<TransactionHash, DeliveryError>;

	/// Waits until the transaction is included with `confirmations` blocks
	/// (inclusion counts as the first) and returns its receipt.
	async fn wait_for_confirmation(
		&self,
		hash: &TransactionHash,
		confirmations: u64,
	) -> Result<TransactionReceipt, DeliveryError>;
}

/// Signature every delivery implementation exposes to build itself.
///
/// `private_key` is `None` when no wallet is connected; the implementation is
/// then read-only and `submit` fails with [`DeliveryError::NoSigner`].
pub type DeliveryFactory = fn(
	&toml::Value,
	&NetworkConfig,
	Option<&SecretString>,
	ConfirmationPolicy,
) -> Result<Box<dyn DeliveryInterface>, DeliveryError>;

/// Registry trait for delivery implementations.
pub trait DeliveryRegistry: ImplementationRegistry<Factory = DeliveryFactory> {}

/// All built-in delivery implementations as (name, factory) pairs.
pub fn get_all_implementations() -> Vec<(&'static str, DeliveryFactory)> {
	use implementations::evm::alloy;

	vec![(alloy::Registry::NAME, alloy::Registry::factory())]
}

/// Wraps the configured transport and applies the confirmation requirement.
pub struct DeliveryService {
	implementation: Box<dyn DeliveryInterface>,
	min_confirmations: u64,
}

impl DeliveryService {
	pub fn new(implementation: Box<dyn DeliveryInterface>, min_confirmations: u64) -> Self {
		Self {
			implementation,
			min_confirmations,
		}
	}

	pub async fn chain_id(&self) -> Result<u64, DeliveryError> {
		self.implementation.chain_id().await
	}

	pub async fn call(&self, call: &ContractCall) -> Result<Bytes, DeliveryError> {
		self.implementation.call(call).await
	}

	/// Submits a transaction; the wallet signs it.
	pub async fn deliver(&self, tx: Transaction) -> Result<TransactionHash, DeliveryError> {
		self.implementation.submit(tx).await
	}

	/// Waits for the configured number of confirmations.
	pub async fn confirm_with_default(
		&self,
		hash: &TransactionHash,
	) -> Result<TransactionReceipt, DeliveryError> {
		self.implementation
			.wait_for_confirmation(hash, self.min_confirmations)
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proofpass_types::{Address, B256, U256};

	fn receipt(success: bool) -> TransactionReceipt {
		TransactionReceipt {
			hash: TransactionHash(B256::repeat_byte(1)),
			block_number: 10,
			success,
			logs: vec![],
		}
	}

	#[tokio::test]
	async fn test_confirm_with_default_uses_min_confirmations() {
		let mut mock = MockDeliveryInterface::new();
		mock.expect_wait_for_confirmation()
			.withf(|_, confirmations| *confirmations == 3)
			.times(1)
			.returning(|_, _| Ok(receipt(true)));

		let service = DeliveryService::new(Box::new(mock), 3);
		let result = service
			.confirm_with_default(&TransactionHash(B256::repeat_byte(1)))
			.await
			.unwrap();
		assert!(result.success);
	}

	#[tokio::test]
	async fn test_deliver_passes_transaction_through() {
		let mut mock = MockDeliveryInterface::new();
		mock.expect_submit()
			.withf(|tx| tx.chain_id == 314159 && tx.value == U256::from(5))
			.times(1)
			.returning(|_| Ok(TransactionHash(B256::repeat_byte(2))));

		let service = DeliveryService::new(Box::new(mock), 1);
		let hash = service
			.deliver(Transaction {
				chain_id: 314159,
				to: Address::repeat_byte(0x11),
				data: Bytes::new(),
				value: U256::from(5),
			})
			.await
			.unwrap();
		assert_eq!(hash, TransactionHash(B256::repeat_byte(2)));
	}
}
