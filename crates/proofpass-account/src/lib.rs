//! Wallet account management for the ProofPass client.
//!
//! An account stands for the "connected wallet": it yields the address that
//! receives issued passes and the key the delivery layer signs with.

use async_trait::async_trait;
use proofpass_types::{Address, ConfigSchema, ImplementationRegistry, SecretString};
use thiserror::Error;

pub mod implementations {
	pub mod local;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// Error that occurs when the account configuration is rejected.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Interface every wallet account implementation provides.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Schema used to validate this implementation's TOML table.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Address of the connected account.
	async fn address(&self) -> Result<Address, AccountError>;

	/// The signing key, `0x`-prefixed, handed to the delivery layer.
	fn get_private_key(&self) -> SecretString;
}

/// Signature every account implementation exposes to build itself from its TOML table.
pub type AccountFactory = fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>;

/// Registry trait for account implementations.
pub trait AccountRegistry: ImplementationRegistry<Factory = AccountFactory> {}

/// All built-in account implementations as (name, factory) pairs.
pub fn get_all_implementations() -> Vec<(&'static str, AccountFactory)> {
	use implementations::local;

	vec![(local::Registry::NAME, local::Registry::factory())]
}

/// Wraps the configured account implementation.
pub struct AccountService {
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	pub async fn get_address(&self) -> Result<Address, AccountError> {
		self.implementation.address().await
	}

	pub fn get_private_key(&self) -> SecretString {
		self.implementation.get_private_key()
	}
}
