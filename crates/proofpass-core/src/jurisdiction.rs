//! SPJurisdiction reads and registration.

use crate::query::{QueryClient, QueryError};
use crate::submitter::{ContractWrite, SubmissionError, TransactionSubmitter};
use alloy_sol_types::SolCall;
use proofpass_types::contracts::ISPJurisdiction;
use proofpass_types::{Address, Bytes, TransactionReceipt, U256};
use std::sync::Arc;
use tracing::info;

/// A storage provider's jurisdiction claim, backed by a verifiable credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JurisdictionRegistration {
	pub country: String,
	pub region: String,
	/// CID of the verifiable credential.
	pub vc_cid: String,
	/// Unix timestamp in seconds.
	pub expiry: u64,
	pub signature: Bytes,
}

pub struct JurisdictionClient {
	query: Arc<QueryClient>,
	submitter: Arc<TransactionSubmitter>,
	address: Address,
}

impl JurisdictionClient {
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

	/// Whether `storage_provider` is registered for the jurisdiction.
	pub async fn is_sp_compliant(
		&self,
		storage_provider: Address,
		country: &str,
		region: &str,
	) -> Result<bool, QueryError> {
		let ret = self
			.query
			.read(
				self.address,
				&ISPJurisdiction::isSPCompliantCall {
					sp: storage_provider,
					country: country.to_string(),
					region: region.to_string(),
				},
			)
			.await?;
		info!(
			storage_provider = %storage_provider,
			country,
			region,
			compliant = ret.compliant,
			"Checked storage provider compliance"
		);
		Ok(ret.compliant)
	}

	/// Registers the connected account as a storage provider for a jurisdiction.
	pub async fn register(
		&self,
		registration: JurisdictionRegistration,
	) -> Result<TransactionReceipt, SubmissionError> {
		let call = ISPJurisdiction::registerJurisdictionCall {
			country: registration.country,
			region: registration.region,
			vcCID: registration.vc_cid,
			expiry: U256::from(registration.expiry),
			signature: registration.signature,
		};
		self.submitter
			.submit(ContractWrite {
				to: self.address,
				calldata: call.abi_encode().into(),
				value: U256::ZERO,
				description: "Register Jurisdiction".to_string(),
			})
			.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::submitter::{AutoApprove, MockTransactionApprover};
	use crate::test_support::{harness, reads};
	use proofpass_delivery::MockDeliveryInterface;

	#[tokio::test]
	async fn test_compliance_read() {
		let mut mock = MockDeliveryInterface::new();
		reads(&mut mock).compliance(true);
		let h = harness(mock, Arc::new(AutoApprove));
		let client = JurisdictionClient::new(
			h.query.clone(),
			h.submitter.clone(),
			h.config.contracts.sp_jurisdiction,
		);

		assert!(client
			.is_sp_compliant(h.config.jurisdiction.storage_provider, "US", "CA")
			.await
			.unwrap());
	}

	#[tokio::test]
	async fn test_declined_registration() {
		let mut mock = MockDeliveryInterface::new();
		mock.expect_submit().never();
		let mut approver = MockTransactionApprover::new();
		approver
			.expect_approve()
			.withf(|request| request.to == Address::repeat_byte(0x22) && request.value.is_zero())
			.times(1)
			.returning(|_| false);
		let h = harness(mock, Arc::new(approver));
		let client = JurisdictionClient::new(
			h.query.clone(),
			h.submitter.clone(),
			h.config.contracts.sp_jurisdiction,
		);

		let result = client
			.register(JurisdictionRegistration {
				country: "US".to_string(),
				region: "CA".to_string(),
				vc_cid: "bafy-credential".to_string(),
				expiry: 1_900_000_000,
				signature: Bytes::from_static(&[0x12; 65]),
			})
			.await;
		assert_eq!(result, Err(SubmissionError::UserRejected));
	}
}
