//! Chain reads with bounded retries.
//!
//! Every read-only contract call goes through [`QueryClient`]. A failed
//! transport call is retried with exponential backoff up to
//! `max_retries` times; a response that does not decode is not retried.
//! Nothing is cached, so every read reflects the chain at call time.

use alloy_sol_types::SolCall;
use backoff::ExponentialBackoffBuilder;
use proofpass_config::QueryConfig;
use proofpass_delivery::DeliveryService;
use proofpass_types::{Address, Bytes, ContractCall};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Errors surfaced by a chain read.
#[derive(Debug, Error)]
pub enum QueryError {
	/// The transport kept failing after all retries.
	#[error("Read failed after {attempts} attempts: {message}")]
	Unavailable { attempts: u32, message: String },
	/// The contract answered with data that does not match the expected ABI.
	#[error("Failed to decode {function} response: {message}")]
	Decode {
		function: &'static str,
		message: String,
	},
}

/// Read-only access to the contracts.
pub struct QueryClient {
	delivery: Arc<DeliveryService>,
	config: QueryConfig,
}

impl QueryClient {
	pub fn new(delivery: Arc<DeliveryService>, config: QueryConfig) -> Self {
		Self { delivery, config }
	}

	/// Calls `call` on the contract at `to` and decodes its return values.
	pub async fn read<C>(&self, to: Address, call: &C) -> Result<C::Return, QueryError>
	where
		C: SolCall + Sync,
	{
		let request = ContractCall {
			to,
			data: Bytes::from(call.abi_encode()),
		};
		let data = self.call_with_retries(&request, C::SIGNATURE).await?;

		C::abi_decode_returns(&data, true).map_err(|e| QueryError::Decode {
			function: C::SIGNATURE,
			message: e.to_string(),
		})
	}

	async fn call_with_retries(
		&self,
		request: &ContractCall,
		function: &'static str,
	) -> Result<Bytes, QueryError> {
		let max_retries = self.config.max_retries;
		let attempts = AtomicU32::new(0);
		let policy = ExponentialBackoffBuilder::new()
			.with_initial_interval(Duration::from_millis(self.config.retry_delay_ms))
			.with_randomization_factor(0.0)
			.with_multiplier(2.0)
			.with_max_elapsed_time(None)
			.build();

		let attempts_ref = &attempts;
		let delivery = &self.delivery;
		let result = backoff::future::retry(policy, || async move {
			let attempt = attempts_ref.fetch_add(1, Ordering::SeqCst) + 1;
			delivery.call(request).await.map_err(|e| {
				if attempt > max_retries {
					backoff::Error::permanent(e)
				} else {
					warn!(function, attempt, error = %e, "Read failed, retrying");
					backoff::Error::transient(e)
				}
			})
		})
		.await;

		result.map_err(|e| QueryError::Unavailable {
			attempts: attempts.load(Ordering::SeqCst),
			message: e.to_string(),
		})
	}
}
