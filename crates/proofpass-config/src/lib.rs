//! Configuration module for the ProofPass client.
//!
//! Configuration is read from a single TOML file. String values may reference
//! environment variables as `${VAR}` or `${VAR:-default}`, which is how the
//! deployed contract addresses and the wallet key are usually supplied.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["contracts.toml", "wallet.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

#[cfg(feature = "testing")]
pub mod builders;
mod loader;

use proofpass_types::{Address, NetworkConfig};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub use loader::ConfigLoader;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// The default Display dumps the whole input; the message is enough.
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the ProofPass client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Chain the client is bound to.
	#[serde(default)]
	pub network: NetworkConfig,
	/// Deployed contract addresses.
	pub contracts: ContractsConfig,
	/// Selectable jurisdictions for issuance.
	#[serde(default)]
	pub jurisdiction: JurisdictionConfig,
	/// Wallet account. Absent means no wallet is connected and every write
	/// fails before touching the chain.
	pub account: Option<AccountConfig>,
	/// Local storage backend for transaction history.
	pub storage: StorageConfig,
	/// Transaction submission and confirmation settings.
	#[serde(default)]
	pub delivery: DeliveryConfig,
	/// Retry policy for chain reads.
	#[serde(default)]
	pub query: QueryConfig,
	/// Parameters of newly issued passes.
	#[serde(default)]
	pub issuance: IssuanceConfig,
	/// Verification page settings.
	#[serde(default)]
	pub verification: VerificationConfig,
}

/// Addresses of the three ProofPass contracts.
///
/// All three must be non-zero; they are normally supplied through
/// environment variables.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ContractsConfig {
	/// Soulbound pass contract: issuance, verification and freshness checks.
	pub residency_pass: Address,
	/// Storage provider jurisdiction registry.
	pub sp_jurisdiction: Address,
	/// Registry of trusted notaries.
	pub notary_registry: Address,
}

/// Jurisdiction choices offered during issuance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JurisdictionConfig {
	/// Countries a pass may be issued for.
	#[serde(default = "default_countries")]
	pub countries: Vec<String>,
	/// Country preselected by the policy step.
	#[serde(default = "default_country")]
	pub default_country: String,
	/// Regions the storage provider is registered for.
	#[serde(default = "default_allowed_regions")]
	pub allowed_regions: Vec<String>,
	/// When set, regions outside `allowed_regions` are refused before submission.
	#[serde(default)]
	pub strict_regions: bool,
	/// Storage provider whose compliance is checked for the selected jurisdiction.
	#[serde(default = "default_storage_provider")]
	pub storage_provider: Address,
}

impl Default for JurisdictionConfig {
	fn default() -> Self {
		Self {
			countries: default_countries(),
			default_country: default_country(),
			allowed_regions: default_allowed_regions(),
			strict_regions: false,
			storage_provider: default_storage_provider(),
		}
	}
}

fn default_countries() -> Vec<String> {
	vec!["US".to_string(), "CA".to_string()]
}

fn default_country() -> String {
	"US".to_string()
}

fn default_allowed_regions() -> Vec<String> {
	vec!["CA".to_string()]
}

fn default_storage_provider() -> Address {
	Address::new([
		0xe1, 0x64, 0x1a, 0x04, 0x93, 0x81, 0x14, 0x9a, 0xfa, 0xac, 0xef, 0x38, 0x6e, 0xe5, 0x8f,
		0xda, 0x5a, 0xd9, 0xbe, 0x32,
	])
}

/// Configuration for account management.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of account implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for transaction delivery.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeliveryConfig {
	/// Which implementation to use as primary.
	#[serde(default = "default_delivery_primary")]
	pub primary: String,
	/// Per-implementation settings. An implementation without an entry is
	/// built from an empty table.
	#[serde(default)]
	pub implementations: HashMap<String, toml::Value>,
	/// Confirmations required before a receipt is considered final.
	#[serde(default = "default_confirmations")]
	pub min_confirmations: u64,
	/// Receipt polling interval.
	#[serde(default = "default_poll_interval_seconds")]
	pub poll_interval_seconds: u64,
	/// Give up waiting for a receipt after this long.
	#[serde(default = "default_confirmation_timeout_seconds")]
	pub confirmation_timeout_seconds: u64,
}

impl Default for DeliveryConfig {
	fn default() -> Self {
		Self {
			primary: default_delivery_primary(),
			implementations: HashMap::new(),
			min_confirmations: default_confirmations(),
			poll_interval_seconds: default_poll_interval_seconds(),
			confirmation_timeout_seconds: default_confirmation_timeout_seconds(),
		}
	}
}

fn default_delivery_primary() -> String {
	"http".to_string()
}

fn default_confirmations() -> u64 {
	1
}

/// Filecoin block time is 30s; a few polls per block is enough.
fn default_poll_interval_seconds() -> u64 {
	7
}

fn default_confirmation_timeout_seconds() -> u64 {
	600
}

/// Retry policy applied to every chain read.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct QueryConfig {
	/// Retries after the first failed attempt.
	#[serde(default = "default_max_retries")]
	pub max_retries: u32,
	/// Initial delay between attempts.
	#[serde(default = "default_retry_delay_ms")]
	pub retry_delay_ms: u64,
}

impl Default for QueryConfig {
	fn default() -> Self {
		Self {
			max_retries: default_max_retries(),
			retry_delay_ms: default_retry_delay_ms(),
		}
	}
}

fn default_max_retries() -> u32 {
	3
}

fn default_retry_delay_ms() -> u64 {
	1000
}

/// Parameters applied to every newly issued pass.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IssuanceConfig {
	/// Pass lifetime; expiry is submission time plus this.
	#[serde(default = "default_validity_seconds")]
	pub validity_seconds: u64,
	/// Document CID sent with `issuePass`. The selected document is not
	/// uploaded, so this stays a placeholder unless configured.
	#[serde(default = "default_document_cid")]
	pub document_cid: String,
	/// Metadata CID sent with `issuePass`.
	#[serde(default = "default_metadata_cid")]
	pub metadata_cid: String,
}

impl Default for IssuanceConfig {
	fn default() -> Self {
		Self {
			validity_seconds: default_validity_seconds(),
			document_cid: default_document_cid(),
			metadata_cid: default_metadata_cid(),
		}
	}
}

/// One year.
fn default_validity_seconds() -> u64 {
	31_536_000
}

fn default_document_cid() -> String {
	"docCID-placeholder".to_string()
}

fn default_metadata_cid() -> String {
	"metaCID-placeholder".to_string()
}

/// Verification and freshness refresh settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerificationConfig {
	/// Wait between a confirmed `triggerPDPCheck` and the freshness re-query.
	#[serde(default = "default_refresh_delay_seconds")]
	pub refresh_delay_seconds: u64,
	/// Base URL used for shareable verification links.
	#[serde(default = "default_app_url")]
	pub app_url: String,
}

impl Default for VerificationConfig {
	fn default() -> Self {
		Self {
			refresh_delay_seconds: default_refresh_delay_seconds(),
			app_url: default_app_url(),
		}
	}
}

fn default_refresh_delay_seconds() -> u64 {
	30
}

fn default_app_url() -> String {
	"http://localhost:8080".to_string()
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to bound regex work.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] if the input is too large or a
/// referenced variable is unset and has no default.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match (std::env::var(var_name.as_str()), cap.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					var_name.as_str()
				)))
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	///
	/// Included paths are resolved relative to the directory of `path`.
	///
	/// # Arguments
	///
	/// * `path` - Path to the main TOML file
	///
	/// # Errors
	///
	/// Returns an error if:
	/// - A file cannot be read
	/// - The merged TOML does not parse or a section is defined twice
	/// - An environment variable without default is unset
	/// - The result fails semantic validation
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Whether `country` is one of the selectable countries.
	///
	/// # Arguments
	///
	/// * `country` - Country code, compared case-sensitively
	pub fn is_supported_country(&self, country: &str) -> bool {
		self.jurisdiction.countries.iter().any(|c| c == country)
	}

	/// Checks the semantic constraints serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.network.chain_id == 0 {
			return Err(ConfigError::Validation(
				"network.chain_id must be greater than 0".into(),
			));
		}
		if self.network.rpc_url.trim().is_empty() {
			return Err(ConfigError::Validation(
				"network.rpc_url cannot be empty".into(),
			));
		}

		for (name, address) in [
			("residency_pass", self.contracts.residency_pass),
			("sp_jurisdiction", self.contracts.sp_jurisdiction),
			("notary_registry", self.contracts.notary_registry),
		] {
			if address.is_zero() {
				return Err(ConfigError::Validation(format!(
					"contracts.{} must be a non-zero address",
					name
				)));
			}
		}

		let jurisdiction = &self.jurisdiction;
		if jurisdiction.countries.is_empty() {
			return Err(ConfigError::Validation(
				"At least one jurisdiction country must be configured".into(),
			));
		}
		if !self.is_supported_country(&jurisdiction.default_country) {
			return Err(ConfigError::Validation(format!(
				"Default country '{}' is not in jurisdiction.countries",
				jurisdiction.default_country
			)));
		}
		if jurisdiction.strict_regions && jurisdiction.allowed_regions.is_empty() {
			return Err(ConfigError::Validation(
				"strict_regions requires at least one allowed region".into(),
			));
		}

		if let Some(account) = &self.account {
			if !account.implementations.contains_key(&account.primary) {
				return Err(ConfigError::Validation(format!(
					"Primary account '{}' not found in implementations",
					account.primary
				)));
			}
		}

		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}

		let delivery = &self.delivery;
		if !delivery.implementations.is_empty()
			&& !delivery.implementations.contains_key(&delivery.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary delivery '{}' not found in implementations",
				delivery.primary
			)));
		}
		if delivery.min_confirmations == 0 {
			return Err(ConfigError::Validation(
				"min_confirmations must be at least 1".into(),
			));
		}
		if delivery.min_confirmations > 100 {
			return Err(ConfigError::Validation(
				"min_confirmations cannot exceed 100".into(),
			));
		}
		if delivery.poll_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"poll_interval_seconds must be greater than 0".into(),
			));
		}
		if delivery.confirmation_timeout_seconds < delivery.poll_interval_seconds {
			return Err(ConfigError::Validation(
				"confirmation_timeout_seconds cannot be shorter than poll_interval_seconds".into(),
			));
		}

		if self.issuance.validity_seconds == 0 {
			return Err(ConfigError::Validation(
				"issuance.validity_seconds must be greater than 0".into(),
			));
		}

		Ok(())
	}
}

/// Parses a TOML string, resolving environment variables and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
