//! Account backed by a private key held in configuration.

use crate::{AccountError, AccountInterface};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use proofpass_types::{
	with_0x_prefix, without_0x_prefix, Address, ConfigSchema, Field, FieldType,
	ImplementationRegistry, Schema, SecretString, ValidationError,
};

/// Local wallet holding its key in memory.
pub struct LocalWallet {
	signer: PrivateKeySigner,
	private_key: SecretString,
}

impl LocalWallet {
	/// Parses a hex private key, with or without `0x`.
	pub fn new(private_key: &SecretString) -> Result<Self, AccountError> {
		let signer = private_key.with_exposed(|key| {
			without_0x_prefix(key.trim())
				.parse::<PrivateKeySigner>()
				.map_err(|e| AccountError::InvalidKey(e.to_string()))
		})?;
		let normalized = private_key.with_exposed(|key| SecretString::from(with_0x_prefix(key.trim())));

		Ok(Self {
			signer,
			private_key: normalized,
		})
	}
}

#[async_trait]
impl AccountInterface for LocalWallet {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LocalWalletSchema)
	}

	async fn address(&self) -> Result<Address, AccountError> {
		Ok(self.signer.address())
	}

	fn get_private_key(&self) -> SecretString {
		self.private_key.clone()
	}
}

/// Configuration schema for the local wallet.
pub struct LocalWalletSchema;

impl ConfigSchema for LocalWalletSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(
			vec![Field::new("private_key", FieldType::String).with_validator(|value| {
				let key = value.as_str().map(|s| without_0x_prefix(s.trim())).unwrap_or("");
				if key.len() != 64 {
					return Err("Private key must be 64 hex characters (32 bytes)".to_string());
				}
				if !key.chars().all(|c| c.is_ascii_hexdigit()) {
					return Err("Private key must contain only hex characters".to_string());
				}
				Ok(())
			})],
			vec![],
		)
		.validate(config)
	}
}

/// Creates a local wallet from `private_key` in its TOML table.
pub fn create_account(config: &toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> {
	LocalWalletSchema
		.validate(config)
		.map_err(|e| AccountError::Configuration(e.to_string()))?;

	let private_key = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.map(SecretString::from)
		.ok_or_else(|| AccountError::Configuration("private_key is required".to_string()))?;

	let wallet = LocalWallet::new(&private_key)?;
	tracing::debug!(address = %wallet.signer.address(), "Loaded local wallet");
	Ok(Box::new(wallet))
}

/// Registry for the local wallet implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = crate::AccountFactory;

	fn factory() -> Self::Factory {
		create_account
	}
}

impl crate::AccountRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	const ANVIL_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const ANVIL_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

	fn table(key: &str) -> toml::Value {
		toml::from_str(&format!("private_key = \"{}\"", key)).unwrap()
	}

	#[tokio::test]
	async fn test_address_from_key() {
		let account = create_account(&table(ANVIL_KEY)).unwrap();
		let expected: Address = ANVIL_ADDRESS.parse().unwrap();
		assert_eq!(account.address().await.unwrap(), expected);
	}

	#[test]
	fn test_private_key_is_normalized() {
		let account = create_account(&table(ANVIL_KEY)).unwrap();
		let key = account.get_private_key();
		assert!(key.with_exposed(|k| k.starts_with("0x") && k.len() == 66));
	}

	#[test]
	fn test_invalid_keys_rejected() {
		assert!(matches!(
			create_account(&table("0x1234")),
			Err(AccountError::Configuration(_))
		));
		let not_hex = "zz".repeat(32);
		assert!(matches!(
			create_account(&table(&not_hex)),
			Err(AccountError::Configuration(_))
		));
		assert!(matches!(
			create_account(&toml::Value::Table(toml::Table::new())),
			Err(AccountError::Configuration(_))
		));
	}
}
