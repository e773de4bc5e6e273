//! Step-by-step pass issuance.
//!
//! The flow only moves forward: Upload, Policy, Pay, then one of the two
//! terminal results. A failed payment keeps the flow on Pay with the error
//! message; `restart` is the only way back to Upload.

use crate::clipboard::{Clipboard, ClipboardError};
use crate::fees::{FeeReader, FeeState};
use crate::receipt::{extract_pass_id, ExtractionOutcome};
use crate::submitter::{ContractWrite, SubmissionError, TransactionSubmitter};
use alloy_sol_types::SolCall;
use proofpass_config::{Config, IssuanceConfig, JurisdictionConfig};
use proofpass_types::contracts::IResidencyPass;
use proofpass_types::{current_timestamp, Address, NetworkConfig, PassId, TransactionHash, U256};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// History label of issuance transactions.
pub const ISSUE_DESCRIPTION: &str = "Issue Residency Pass";

#[derive(Debug, Error)]
pub enum FlowError {
	#[error("Not available at the {0} step")]
	WrongStep(&'static str),
	#[error("Please select a document to continue")]
	NoDocument,
	#[error("Please select a country")]
	CountryRequired,
	#[error("Country '{0}' is not supported")]
	UnsupportedCountry(String),
	#[error("Region '{0}' is not covered by the storage provider's jurisdiction")]
	RegionNotAllowed(String),
	#[error("The issuance fee is not available yet")]
	FeeNotReady,
	#[error("No pass id to copy")]
	NoPassId,
	#[error(transparent)]
	Submission(#[from] SubmissionError),
	#[error(transparent)]
	Clipboard(#[from] ClipboardError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuanceStep {
	Upload,
	Policy,
	Pay,
	Issued {
		pass_id: PassId,
		tx_hash: TransactionHash,
	},
	/// Confirmed, but the receipt did not yield a pass id.
	CompletedWithIssues { tx_hash: TransactionHash },
}

impl IssuanceStep {
	pub fn name(&self) -> &'static str {
		match self {
			IssuanceStep::Upload => "Upload",
			IssuanceStep::Policy => "Policy",
			IssuanceStep::Pay => "Pay",
			IssuanceStep::Issued { .. } => "Pass",
			IssuanceStep::CompletedWithIssues { .. } => "Pass",
		}
	}

	pub fn tx_hash(&self) -> Option<TransactionHash> {
		match self {
			IssuanceStep::Issued { tx_hash, .. } | IssuanceStep::CompletedWithIssues { tx_hash } => {
				Some(*tx_hash)
			},
			_ => None,
		}
	}
}

impl fmt::Display for IssuanceStep {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// The residency document picked in the Upload step. Only its name and size
/// are kept; the content is never uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSelection {
	pub name: String,
	pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySelection {
	pub country: String,
	/// Empty when no region was given.
	pub region: String,
}

pub struct IssuanceFlow {
	residency_pass: Address,
	network: NetworkConfig,
	jurisdiction: JurisdictionConfig,
	issuance: IssuanceConfig,
	fees: FeeReader,
	submitter: Arc<TransactionSubmitter>,
	clipboard: Arc<dyn Clipboard>,
	step: IssuanceStep,
	document: Option<DocumentSelection>,
	policy: Option<PolicySelection>,
	fee: FeeState,
	last_error: Option<String>,
}

impl IssuanceFlow {
	pub fn new(
		config: &Config,
		fees: FeeReader,
		submitter: Arc<TransactionSubmitter>,
		clipboard: Arc<dyn Clipboard>,
	) -> Self {
		Self {
			residency_pass: config.contracts.residency_pass,
			network: config.network.clone(),
			jurisdiction: config.jurisdiction.clone(),
			issuance: config.issuance.clone(),
			fees,
			submitter,
			clipboard,
			step: IssuanceStep::Upload,
			document: None,
			policy: None,
			fee: FeeState::Loading,
			last_error: None,
		}
	}

	pub fn step(&self) -> &IssuanceStep {
		&self.step
	}

	pub fn document(&self) -> Option<&DocumentSelection> {
		self.document.as_ref()
	}

	pub fn policy(&self) -> Option<&PolicySelection> {
		self.policy.as_ref()
	}

	pub fn fee(&self) -> &FeeState {
		&self.fee
	}

	/// Message of the last failed payment, while still on Pay.
	pub fn last_error(&self) -> Option<&str> {
		self.last_error.as_deref()
	}

	/// Picks (or replaces) the residency document.
	pub fn select_document(&mut self, name: impl Into<String>, size: u64) -> Result<(), FlowError> {
		self.expect_step(&IssuanceStep::Upload)?;
		self.document = Some(DocumentSelection {
			name: name.into(),
			size,
		});
		Ok(())
	}

	/// Upload to Policy; requires a selected document.
	pub fn continue_to_policy(&mut self) -> Result<(), FlowError> {
		self.expect_step(&IssuanceStep::Upload)?;
		if self.document.is_none() {
			return Err(FlowError::NoDocument);
		}
		self.step = IssuanceStep::Policy;
		Ok(())
	}

	/// Policy to Pay with the chosen jurisdiction.
	pub fn select_policy(&mut self, country: &str, region: Option<&str>) -> Result<(), FlowError> {
		self.expect_step(&IssuanceStep::Policy)?;

		let country = country.trim().to_uppercase();
		if country.is_empty() {
			return Err(FlowError::CountryRequired);
		}
		if !self.jurisdiction.countries.iter().any(|c| c.eq_ignore_ascii_case(&country)) {
			return Err(FlowError::UnsupportedCountry(country));
		}

		let region = region.map(str::trim).unwrap_or_default().to_string();
		if !region.is_empty()
			&& self.jurisdiction.strict_regions
			&& !self
				.jurisdiction
				.allowed_regions
				.iter()
				.any(|r| r.eq_ignore_ascii_case(&region))
		{
			return Err(FlowError::RegionNotAllowed(region));
		}

		self.policy = Some(PolicySelection { country, region });
		self.step = IssuanceStep::Pay;
		Ok(())
	}

	/// Reads the current issuance fee.
	pub async fn refresh_fee(&mut self) -> &FeeState {
		self.fee = self.fees.issuance_fee().await;
		&self.fee
	}

	/// Submits `issuePass` with the loaded fee and waits for the result.
	#[instrument(skip_all)]
	pub async fn pay(&mut self) -> Result<&IssuanceStep, FlowError> {
		self.expect_step(&IssuanceStep::Pay)?;
		let fee = self.fee.ready_amount().ok_or(FlowError::FeeNotReady)?;
		let policy = self.policy.clone().ok_or(FlowError::WrongStep("Pay"))?;
		self.last_error = None;

		match self.submit_issuance(&policy, fee).await {
			Ok(step) => {
				self.step = step;
				Ok(&self.step)
			},
			Err(e) => {
				self.last_error = Some(e.to_string());
				Err(FlowError::Submission(e))
			},
		}
	}

	async fn submit_issuance(
		&self,
		policy: &PolicySelection,
		fee: U256,
	) -> Result<IssuanceStep, SubmissionError> {
		let recipient = self.submitter.connected_address().await?;
		let expiry = U256::from(current_timestamp() + self.issuance.validity_seconds);
		let call = IResidencyPass::issuePassCall {
			to: recipient,
			country: policy.country.clone(),
			region: policy.region.clone(),
			docCID: self.issuance.document_cid.clone(),
			metaCID: self.issuance.metadata_cid.clone(),
			expiry,
		};

		info!(
			to = %recipient,
			country = %policy.country,
			region = %policy.region,
			doc_cid = %self.issuance.document_cid,
			meta_cid = %self.issuance.metadata_cid,
			expiry = %expiry,
			fee = %fee,
			"Issuing residency pass"
		);

		let receipt = self
			.submitter
			.submit(ContractWrite {
				to: self.residency_pass,
				calldata: call.abi_encode().into(),
				value: fee,
				description: ISSUE_DESCRIPTION.to_string(),
			})
			.await?;

		Ok(match extract_pass_id(&receipt) {
			ExtractionOutcome::Found(pass_id) => {
				info!(pass_id = %pass_id, tx_hash = %receipt.hash, "Residency pass issued");
				IssuanceStep::Issued {
					pass_id,
					tx_hash: receipt.hash,
				}
			},
			ExtractionOutcome::NotFound => {
				warn!(tx_hash = %receipt.hash, "Transaction confirmed but no pass id was found");
				IssuanceStep::CompletedWithIssues {
					tx_hash: receipt.hash,
				}
			},
		})
	}

	/// Explorer page of the issuance transaction, once there is one.
	pub fn explorer_link(&self) -> Option<String> {
		self.step
			.tx_hash()
			.map(|hash| self.network.explorer_tx_url(&hash.to_string()))
	}

	/// Puts exactly the pass id on the clipboard and returns it.
	pub fn copy_pass_id(&self) -> Result<String, FlowError> {
		let IssuanceStep::Issued { pass_id, .. } = &self.step else {
			return Err(FlowError::NoPassId);
		};
		let text = pass_id.to_string();
		self.clipboard.copy(&text)?;
		Ok(text)
	}

	/// Back to Upload with every selection cleared.
	pub fn restart(&mut self) {
		self.step = IssuanceStep::Upload;
		self.document = None;
		self.policy = None;
		self.fee = FeeState::Loading;
		self.last_error = None;
		self.submitter.reset();
	}

	fn expect_step(&self, expected: &IssuanceStep) -> Result<(), FlowError> {
		if std::mem::discriminant(&self.step) == std::mem::discriminant(expected) {
			Ok(())
		} else {
			Err(FlowError::WrongStep(self.step.name()))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::clipboard::MemoryClipboard;
	use crate::submitter::{AutoApprove, MockTransactionApprover, SubmissionState};
	use crate::test_support::{harness, harness_with, mined, pass_issued_log, reads, Harness};
	use proofpass_config::builders::ConfigBuilder;
	use proofpass_delivery::MockDeliveryInterface;
	use proofpass_types::{TransactionStatus, B256};

	const FIVE_TFIL: u128 = 5_000_000_000_000_000_000;

	fn flow(h: &Harness, clipboard: Arc<MemoryClipboard>) -> IssuanceFlow {
		IssuanceFlow::new(
			&h.config,
			FeeReader::new(h.query.clone(), h.config.contracts.residency_pass),
			h.submitter.clone(),
			clipboard,
		)
	}

	fn to_pay(flow: &mut IssuanceFlow) {
		flow.select_document("passport.pdf", 1024).unwrap();
		flow.continue_to_policy().unwrap();
		flow.select_policy("US", Some("CA")).unwrap();
	}

	fn issuing_mock(logs: Vec<proofpass_types::EventLog>) -> MockDeliveryInterface {
		let mut mock = MockDeliveryInterface::new();
		reads(&mut mock).issuance_fee(U256::from(FIVE_TFIL));
		mock.expect_submit()
			.withf(|tx| {
				tx.value == U256::from(FIVE_TFIL)
					&& tx.data.starts_with(&IResidencyPass::issuePassCall::SELECTOR)
			})
			.times(1)
			.returning(|_| Ok(TransactionHash(B256::repeat_byte(0xab))));
		mock.expect_wait_for_confirmation()
			.times(1)
			.returning(move |hash, _| Ok(mined(*hash, true, logs.clone())));
		mock
	}

	#[tokio::test]
	async fn test_issues_pass_and_copies_id() {
		let h = harness(issuing_mock(vec![pass_issued_log(U256::from(1))]), Arc::new(AutoApprove));
		let clipboard = Arc::new(MemoryClipboard::new());
		let mut flow = flow(&h, clipboard.clone());

		to_pay(&mut flow);
		assert_eq!(flow.refresh_fee().await, &FeeState::Ready(U256::from(FIVE_TFIL)));
		assert_eq!(flow.fee().display(&h.config.network), "5 tFIL");

		let step = flow.pay().await.unwrap().clone();
		let IssuanceStep::Issued { pass_id, tx_hash } = step else {
			panic!("expected Issued, got {:?}", step);
		};
		assert_eq!(pass_id.to_string(), "1");
		assert_eq!(flow.copy_pass_id().unwrap(), "1");
		assert_eq!(clipboard.content().as_deref(), Some("1"));
		assert_eq!(
			flow.explorer_link().unwrap(),
			format!("https://calibration.filfox.info/en/message/{}", tx_hash)
		);
		assert_eq!(h.history.list().await[0].status, TransactionStatus::Success);
	}

	#[tokio::test]
	async fn test_no_pass_id_completes_with_issues() {
		let h = harness(issuing_mock(vec![]), Arc::new(AutoApprove));
		let mut flow = flow(&h, Arc::new(MemoryClipboard::new()));

		to_pay(&mut flow);
		flow.refresh_fee().await;
		let step = flow.pay().await.unwrap().clone();

		assert!(matches!(step, IssuanceStep::CompletedWithIssues { .. }));
		assert!(flow.explorer_link().is_some());
		assert!(matches!(flow.copy_pass_id(), Err(FlowError::NoPassId)));
	}

	#[tokio::test]
	async fn test_rejection_stays_on_pay() {
		let mut mock = MockDeliveryInterface::new();
		reads(&mut mock).issuance_fee(U256::from(FIVE_TFIL));
		mock.expect_submit().never();
		let mut approver = MockTransactionApprover::new();
		approver.expect_approve().times(1).returning(|_| false);

		let h = harness(mock, Arc::new(approver));
		let mut flow = flow(&h, Arc::new(MemoryClipboard::new()));
		to_pay(&mut flow);
		flow.refresh_fee().await;

		let err = flow.pay().await.unwrap_err();
		assert!(matches!(err, FlowError::Submission(SubmissionError::UserRejected)));
		assert_eq!(flow.step(), &IssuanceStep::Pay);
		assert_eq!(flow.last_error(), Some("Transaction was rejected in your wallet"));
		assert!(matches!(h.submitter.state(), SubmissionState::Rejected { .. }));
	}

	#[tokio::test]
	async fn test_pay_requires_loaded_fee() {
		let mut mock = MockDeliveryInterface::new();
		mock.expect_submit().never();
		let h = harness(mock, Arc::new(AutoApprove));
		let mut flow = flow(&h, Arc::new(MemoryClipboard::new()));
		to_pay(&mut flow);

		assert!(matches!(flow.pay().await, Err(FlowError::FeeNotReady)));
		assert_eq!(flow.step(), &IssuanceStep::Pay);
	}

	#[tokio::test]
	async fn test_pay_without_wallet() {
		let mut mock = MockDeliveryInterface::new();
		reads(&mut mock).issuance_fee(U256::ZERO);
		mock.expect_submit().never();
		let h = harness_with(
			ConfigBuilder::new().without_account().build(),
			mock,
			Arc::new(AutoApprove),
		);
		let mut flow = flow(&h, Arc::new(MemoryClipboard::new()));
		to_pay(&mut flow);
		assert_eq!(flow.refresh_fee().await, &FeeState::Ready(U256::ZERO));

		let err = flow.pay().await.unwrap_err();
		assert!(matches!(err, FlowError::Submission(SubmissionError::WalletNotConnected)));
	}

	#[tokio::test]
	async fn test_upload_requires_document() {
		let h = harness(MockDeliveryInterface::new(), Arc::new(AutoApprove));
		let mut flow = flow(&h, Arc::new(MemoryClipboard::new()));

		assert!(matches!(flow.continue_to_policy(), Err(FlowError::NoDocument)));
		assert!(matches!(flow.select_policy("US", None), Err(FlowError::WrongStep("Upload"))));
		assert_eq!(flow.step(), &IssuanceStep::Upload);
	}

	#[tokio::test]
	async fn test_policy_validation() {
		let config = ConfigBuilder::new().strict_regions(true).build();
		let h = harness_with(config, MockDeliveryInterface::new(), Arc::new(AutoApprove));
		let mut flow = flow(&h, Arc::new(MemoryClipboard::new()));
		flow.select_document("lease.pdf", 10).unwrap();
		flow.continue_to_policy().unwrap();

		assert!(matches!(flow.select_policy("  ", None), Err(FlowError::CountryRequired)));
		assert!(matches!(flow.select_policy("FR", None), Err(FlowError::UnsupportedCountry(c)) if c == "FR"));
		assert!(matches!(flow.select_policy("US", Some("NY")), Err(FlowError::RegionNotAllowed(r)) if r == "NY"));
		assert_eq!(flow.step(), &IssuanceStep::Policy);

		flow.select_policy("ca", None).unwrap();
		assert_eq!(
			flow.policy(),
			Some(&PolicySelection {
				country: "CA".to_string(),
				region: String::new()
			})
		);
		assert_eq!(flow.step(), &IssuanceStep::Pay);
	}

	#[tokio::test]
	async fn test_restart_clears_everything() {
		let h = harness(issuing_mock(vec![pass_issued_log(U256::from(8))]), Arc::new(AutoApprove));
		let mut flow = flow(&h, Arc::new(MemoryClipboard::new()));
		to_pay(&mut flow);
		flow.refresh_fee().await;
		flow.pay().await.unwrap();

		flow.restart();
		assert_eq!(flow.step(), &IssuanceStep::Upload);
		assert!(flow.document().is_none());
		assert!(flow.policy().is_none());
		assert_eq!(flow.fee(), &FeeState::Loading);
		assert_eq!(h.submitter.state(), SubmissionState::Idle);
	}
}
