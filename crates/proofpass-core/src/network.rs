//! Wrong-network detection.
//!
//! A mismatch between the RPC endpoint's chain and the configured one is an
//! advisory: it is reported and logged, never turned into an error.

use proofpass_delivery::DeliveryService;
use proofpass_types::NetworkConfig;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkStatus {
	pub expected_chain_id: u64,
	/// `None` when the endpoint could not be reached.
	pub current_chain_id: Option<u64>,
	network_name: String,
}

impl NetworkStatus {
	pub fn is_correct_chain(&self) -> bool {
		self.current_chain_id == Some(self.expected_chain_id)
	}

	/// Text shown while connected to the wrong chain.
	pub fn warning(&self) -> Option<String> {
		match self.current_chain_id {
			Some(current) if current != self.expected_chain_id => Some(format!(
				"Please switch to {} testnet (Chain ID: {})",
				self.network_name, self.expected_chain_id
			)),
			_ => None,
		}
	}
}

/// Compares the endpoint's chain id with the configured one.
pub async fn check_network(delivery: &DeliveryService, network: &NetworkConfig) -> NetworkStatus {
	let current_chain_id = match delivery.chain_id().await {
		Ok(chain_id) => Some(chain_id),
		Err(e) => {
			warn!(error = %e, "Could not read chain id from RPC endpoint");
			None
		},
	};

	let status = NetworkStatus {
		expected_chain_id: network.chain_id,
		current_chain_id,
		network_name: network.name.clone(),
	};
	if let Some(current) = current_chain_id.filter(|_| !status.is_correct_chain()) {
		warn!(
			current_chain_id = current,
			expected_chain_id = network.chain_id,
			"Connected to the wrong network"
		);
	}
	status
}
