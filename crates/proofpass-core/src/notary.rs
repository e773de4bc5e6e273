//! NotaryRegistry reads and administration.

use crate::query::{QueryClient, QueryError};
use crate::submitter::{ContractWrite, SubmissionError, TransactionSubmitter};
use alloy_sol_types::SolCall;
use proofpass_types::contracts::INotaryRegistry;
use proofpass_types::{Address, TransactionReceipt, U256};
use std::sync::Arc;

pub struct NotaryRegistryClient {
	query: Arc<QueryClient>,
	submitter: Arc<TransactionSubmitter>,
	address: Address,
}

impl NotaryRegistryClient {
	pub fn new(query: Arc<QueryClient>, submitter: Arc<TransactionSubmitter>, address: Address) -> Self {
		Self {
			query,
			submitter,
			address,
		}
	}

	pub fn address(&self) -> Address {
		self.address
	}

	pub async fn is_notary(&self, notary: Address) -> Result<bool, QueryError> {
		let ret = self
			.query
			.read(self.address, &INotaryRegistry::isNotaryCall { notary })
			.await?;
		Ok(ret.registered)
	}

	pub async fn notary_count(&self) -> Result<U256, QueryError> {
		let ret = self
			.query
			.read(self.address, &INotaryRegistry::getNotaryCountCall {})
			.await?;
		Ok(ret.count)
	}

	/// Registers `notary` under a decentralized identifier.
	pub async fn add_notary(
		&self,
		notary: Address,
		did: &str,
	) -> Result<TransactionReceipt, SubmissionError> {
		let call = INotaryRegistry::addNotaryCall {
			notary,
			did: did.to_string(),
		};
		self.write(call.abi_encode(), "Add Notary").await
	}

	pub async fn remove_notary(&self, notary: Address) -> Result<TransactionReceipt, SubmissionError> {
		let call = INotaryRegistry::removeNotaryCall { notary };
		self.write(call.abi_encode(), "Remove Notary").await
	}

	async fn write(
		&self,
		calldata: Vec<u8>,
		description: &str,
	) -> Result<TransactionReceipt, SubmissionError> {
		self.submitter
			.submit(ContractWrite {
				to: self.address,
				calldata: calldata.into(),
				value: U256::ZERO,
				description: description.to_string(),
			})
			.await
	}
}
