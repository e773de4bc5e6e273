//! Network configuration types.
//!
//! ProofPass talks to exactly one chain. This module describes it: chain id,
//! RPC endpoint, block explorer and native currency.

use serde::{Deserialize, Serialize};

/// Configuration for the blockchain network the client is bound to.
///
/// # Fields
///
/// * `chain_id` - The chain the wallet is expected to be connected to
/// * `name` - Display name of the network
/// * `rpc_url` - The HTTP(S) RPC endpoint for blockchain interaction
/// * `explorer_base` - Base URL of the block explorer
/// * `currency_symbol` - Native currency ticker (e.g. "tFIL")
/// * `currency_decimals` - Decimals of the native currency
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkConfig {
	#[serde(default = "default_chain_id")]
	pub chain_id: u64,
	#[serde(default = "default_name")]
	pub name: String,
	#[serde(default = "default_rpc_url")]
	pub rpc_url: String,
	#[serde(default = "default_explorer_base")]
	pub explorer_base: String,
	#[serde(default = "default_currency_symbol")]
	pub currency_symbol: String,
	#[serde(default = "default_currency_decimals")]
	pub currency_decimals: u8,
}

impl NetworkConfig {
	/// Explorer page of a transaction (the explorer calls them messages).
	pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
		format!("{}/message/{}", self.explorer_base.trim_end_matches('/'), tx_hash)
	}

	/// Explorer page of an address.
	pub fn explorer_address_url(&self, address: &str) -> String {
		format!("{}/address/{}", self.explorer_base.trim_end_matches('/'), address)
	}
}

impl Default for NetworkConfig {
	fn default() -> Self {
		Self {
			chain_id: default_chain_id(),
			name: default_name(),
			rpc_url: default_rpc_url(),
			explorer_base: default_explorer_base(),
			currency_symbol: default_currency_symbol(),
			currency_decimals: default_currency_decimals(),
		}
	}
}

/// Filecoin Calibration testnet.
fn default_chain_id() -> u64 {
	314159
}

fn default_name() -> String {
	"Filecoin Calibration".to_string()
}

fn default_rpc_url() -> String {
	"https://calibration.filfox.info/rpc/v1".to_string()
}

fn default_explorer_base() -> String {
	"https://calibration.filfox.info/en".to_string()
}

fn default_currency_symbol() -> String {
	"tFIL".to_string()
}

fn default_currency_decimals() -> u8 {
	18
}
