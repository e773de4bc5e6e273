//! Issuance and freshness-check prices.

use crate::query::QueryClient;
use proofpass_types::contracts::IResidencyPass;
use proofpass_types::{format_token_amount, Address, NetworkConfig, U256};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// A fee as seen by the caller.
///
/// `Loading` and `Ready(U256::ZERO)` are different states: a zero fee is a
/// valid price, a missing one is not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeState {
	Loading,
	/// Price in the smallest unit of the native currency.
	Ready(U256),
	/// The read failed after all retries.
	Unavailable(String),
}

impl FeeState {
	/// The amount, only once the fee has been read.
	pub fn ready_amount(&self) -> Option<U256> {
		match self {
			FeeState::Ready(amount) => Some(*amount),
			_ => None,
		}
	}

	pub fn is_ready(&self) -> bool {
		matches!(self, FeeState::Ready(_))
	}

	/// Renders the fee in whole units of the network currency, e.g. `5 tFIL`.
	pub fn display(&self, network: &NetworkConfig) -> String {
		match self {
			FeeState::Loading => "Loading...".to_string(),
			FeeState::Ready(amount) => format!(
				"{} {}",
				format_token_amount(&amount.to_string(), network.currency_decimals),
				network.currency_symbol
			),
			FeeState::Unavailable(_) => "Unavailable".to_string(),
		}
	}
}

impl fmt::Display for FeeState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FeeState::Loading => write!(f, "loading"),
			FeeState::Ready(amount) => write!(f, "{}", amount),
			FeeState::Unavailable(reason) => write!(f, "unavailable ({})", reason),
		}
	}
}

/// Reads the prices set on the ResidencyPass contract.
pub struct FeeReader {
	query: Arc<QueryClient>,
	residency_pass: Address,
}

impl FeeReader {
	pub fn new(query: Arc<QueryClient>, residency_pass: Address) -> Self {
		Self {
			query,
			residency_pass,
		}
	}

	/// Price of `issuePass`.
	pub async fn issuance_fee(&self) -> FeeState {
		match self
			.query
			.read(self.residency_pass, &IResidencyPass::feeAmountCall {})
			.await
		{
			Ok(ret) => FeeState::Ready(ret.fee),
			Err(e) => {
				warn!(fee = "issuance", error = %e, "Fee unavailable");
				FeeState::Unavailable(e.to_string())
			},
		}
	}

	/// Price of `triggerPDPCheck`.
	pub async fn freshness_fee(&self) -> FeeState {
		match self
			.query
			.read(self.residency_pass, &IResidencyPass::pdpFeeCall {})
			.await
		{
			Ok(ret) => FeeState::Ready(ret.fee),
			Err(e) => {
				warn!(fee = "freshness", error = %e, "Fee unavailable");
				FeeState::Unavailable(e.to_string())
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{query_client, reads};
	use proofpass_delivery::{DeliveryError, MockDeliveryInterface};

	#[test]
	fn test_zero_fee_is_ready_not_loading() {
		let zero = FeeState::Ready(U256::ZERO);
		assert!(zero.is_ready());
		assert_eq!(zero.ready_amount(), Some(U256::ZERO));
		assert_ne!(zero, FeeState::Loading);
		assert_eq!(FeeState::Loading.ready_amount(), None);
	}

	#[test]
	fn test_display_in_network_currency() {
		let network = NetworkConfig::default();
		let five = U256::from(5_000_000_000_000_000_000u128);
		assert_eq!(FeeState::Ready(five).display(&network), "5 tFIL");
		assert_eq!(FeeState::Loading.display(&network), "Loading...");
	}

	#[tokio::test]
	async fn test_reads_both_fees() {
		let mut mock = MockDeliveryInterface::new();
		reads(&mut mock)
			.issuance_fee(U256::from(5))
			.freshness_fee(U256::from(1));

		let fees = FeeReader::new(query_client(mock), Address::repeat_byte(0x11));
		assert_eq!(fees.issuance_fee().await, FeeState::Ready(U256::from(5)));
		assert_eq!(fees.freshness_fee().await, FeeState::Ready(U256::from(1)));
	}

	#[tokio::test]
	async fn test_failed_read_is_unavailable() {
		let mut mock = MockDeliveryInterface::new();
		mock.expect_call()
			.returning(|_| Err(DeliveryError::Network("down".into())));

		let fees = FeeReader::new(query_client(mock), Address::repeat_byte(0x11));
		assert!(matches!(fees.issuance_fee().await, FeeState::Unavailable(_)));
	}
}
