//! Pass verification and data-possession freshness.
//!
//! Every check is a live read. Freshness is only looked up for a pass that
//! verified as valid. A refresh pays `pdpFee` for `triggerPDPCheck`, waits a
//! fixed delay and reads the freshness again once.

use crate::fees::FeeReader;
use crate::query::{QueryClient, QueryError};
use crate::submitter::{ContractWrite, SubmissionError, TransactionSubmitter};
use alloy_sol_types::SolCall;
use proofpass_types::contracts::IResidencyPass;
use proofpass_types::{Address, FreshnessResult, PassId, PassIdError, VerificationResult};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Query parameter carrying the pass id in verification links.
pub const PASS_ID_PARAM: &str = "passId";

/// History label of freshness refresh transactions.
pub const REFRESH_DESCRIPTION: &str = "Trigger PDP Check";

#[derive(Debug, Error)]
pub enum VerifyError {
	#[error(transparent)]
	InvalidPassId(#[from] PassIdError),
	#[error("Invalid verification link: {0}")]
	InvalidLink(String),
	#[error(transparent)]
	Query(#[from] QueryError),
	#[error("The freshness check fee is not available: {0}")]
	FeeUnavailable(String),
	#[error(transparent)]
	Submission(#[from] SubmissionError),
}

/// What a verification shows: the pass, and its freshness when valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
	pub pass_id: PassId,
	pub result: VerificationResult,
	pub freshness: Option<FreshnessResult>,
}

/// Pass id from a verification link.
///
/// `Ok(None)` when the link has no `passId` parameter. Anything other than a
/// positive integer is an error, so no chain read happens for it. Relative
/// links such as `/verify?passId=3` are accepted.
pub fn pass_id_from_link(link: &str) -> Result<Option<PassId>, VerifyError> {
	let base = Url::parse("http://localhost/").map_err(|e| VerifyError::InvalidLink(e.to_string()))?;
	let url = base
		.join(link.trim())
		.map_err(|e| VerifyError::InvalidLink(e.to_string()))?;

	match url.query_pairs().find(|(key, _)| key == PASS_ID_PARAM) {
		Some((_, value)) => {
			let pass_id = value.parse::<PassId>().map_err(|e| match e {
				PassIdError::Missing => PassIdError::NotANumber,
				other => other,
			})?;
			Ok(Some(pass_id))
		},
		None => Ok(None),
	}
}

/// Shareable link that opens the verification of `pass_id`.
pub fn share_link(app_url: &str, pass_id: &PassId) -> String {
	format!(
		"{}/verify?{}={}",
		app_url.trim_end_matches('/'),
		PASS_ID_PARAM,
		pass_id
	)
}

pub struct VerificationService {
	query: Arc<QueryClient>,
	fees: FeeReader,
	submitter: Arc<TransactionSubmitter>,
	residency_pass: Address,
	refresh_delay: Duration,
}

impl VerificationService {
	pub fn new(
		query: Arc<QueryClient>,
		submitter: Arc<TransactionSubmitter>,
		residency_pass: Address,
		refresh_delay: Duration,
	) -> Self {
		Self {
			fees: FeeReader::new(query.clone(), residency_pass),
			query,
			submitter,
			residency_pass,
			refresh_delay,
		}
	}

	/// `verifyResidency` for `pass_id`.
	pub async fn verify(&self, pass_id: &PassId) -> Result<VerificationResult, VerifyError> {
		let ret = self
			.query
			.read(
				self.residency_pass,
				&IResidencyPass::verifyResidencyCall {
					passId: pass_id.as_u256(),
				},
			)
			.await?;
		debug!(pass_id = %pass_id, is_valid = ret.isValid, "Verified pass");
		Ok(VerificationResult {
			is_valid: ret.isValid,
			pass: ret.pass.into(),
		})
	}

	/// `getPDPFreshness` for `pass_id`.
	pub async fn freshness(&self, pass_id: &PassId) -> Result<FreshnessResult, VerifyError> {
		let ret = self
			.query
			.read(
				self.residency_pass,
				&IResidencyPass::getPDPFreshnessCall {
					passId: pass_id.as_u256(),
				},
			)
			.await?;
		Ok(FreshnessResult {
			is_fresh: ret.isFresh,
			last_checked: u64::try_from(ret.lastChecked).unwrap_or(u64::MAX),
		})
	}

	/// Verification plus freshness, the latter only for a valid pass.
	pub async fn report(&self, pass_id: PassId) -> Result<VerificationReport, VerifyError> {
		let result = self.verify(&pass_id).await?;
		let freshness = if result.is_valid {
			Some(self.freshness(&pass_id).await?)
		} else {
			None
		};
		Ok(VerificationReport {
			pass_id,
			result,
			freshness,
		})
	}

	/// Parses user input, then reports.
	pub async fn report_input(&self, input: &str) -> Result<VerificationReport, VerifyError> {
		let pass_id = input.parse::<PassId>()?;
		self.report(pass_id).await
	}

	/// Pays for a new data-possession check and re-reads freshness after the
	/// configured delay.
	#[instrument(skip(self), fields(pass_id = %pass_id))]
	pub async fn refresh_freshness(&self, pass_id: &PassId) -> Result<FreshnessResult, VerifyError> {
		let fee = self.fees.freshness_fee().await;
		let value = fee
			.ready_amount()
			.ok_or_else(|| VerifyError::FeeUnavailable(fee.to_string()))?;

		let call = IResidencyPass::triggerPDPCheckCall {
			passId: pass_id.as_u256(),
		};
		let receipt = self
			.submitter
			.submit(ContractWrite {
				to: self.residency_pass,
				calldata: call.abi_encode().into(),
				value,
				description: REFRESH_DESCRIPTION.to_string(),
			})
			.await?;

		info!(
			tx_hash = %receipt.hash,
			delay_seconds = self.refresh_delay.as_secs(),
			"PDP check triggered, waiting before re-reading freshness"
		);
		tokio::time::sleep(self.refresh_delay).await;
		self.freshness(pass_id).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::submitter::AutoApprove;
	use crate::test_support::{harness, mined, reads, sample_pass, Harness};
	use proofpass_delivery::MockDeliveryInterface;
	use proofpass_types::{TransactionHash, B256, U256};

	fn service(h: &Harness) -> VerificationService {
		VerificationService::new(
			h.query.clone(),
			h.submitter.clone(),
			h.config.contracts.residency_pass,
			Duration::ZERO,
		)
	}

	#[test]
	fn test_pass_id_from_link() {
		assert_eq!(
			pass_id_from_link("http://localhost:8080/verify?passId=12").unwrap(),
			PassId::try_from(12).ok()
		);
		assert_eq!(
			pass_id_from_link("/verify?passId=3").unwrap(),
			PassId::try_from(3).ok()
		);
		assert_eq!(pass_id_from_link("/verify").unwrap(), None);
		assert!(matches!(
			pass_id_from_link("/verify?passId=abc"),
			Err(VerifyError::InvalidPassId(PassIdError::NotANumber))
		));
		assert!(matches!(
			pass_id_from_link("/verify?passId="),
			Err(VerifyError::InvalidPassId(PassIdError::NotANumber))
		));
		assert!(matches!(
			pass_id_from_link("/verify?passId=0"),
			Err(VerifyError::InvalidPassId(PassIdError::NotPositive))
		));
	}

	#[test]
	fn test_share_link() {
		let id = PassId::try_from(7).unwrap();
		assert_eq!(
			share_link("http://localhost:8080/", &id),
			"http://localhost:8080/verify?passId=7"
		);
		assert_eq!(pass_id_from_link(&share_link("https://proofpass.app", &id)).unwrap(), Some(id));
	}

	#[tokio::test]
	async fn test_invalid_input_never_reads_chain() {
		let mut mock = MockDeliveryInterface::new();
		mock.expect_call().never();
		let h = harness(mock, Arc::new(AutoApprove));

		let err = service(&h).report_input("abc").await.unwrap_err();
		assert!(matches!(err, VerifyError::InvalidPassId(PassIdError::NotANumber)));
	}

	#[tokio::test]
	async fn test_valid_pass_includes_freshness() {
		let mut mock = MockDeliveryInterface::new();
		reads(&mut mock)
			.verification(true, sample_pass())
			.freshness(vec![(true, 1_700_000_000)]);
		let h = harness(mock, Arc::new(AutoApprove));

		let report = service(&h).report_input("1").await.unwrap();
		assert!(report.result.is_valid);
		assert_eq!(report.result.pass.country, "US");
		assert_eq!(report.result.pass.document_cid, "docCID-placeholder");
		assert_eq!(
			report.freshness,
			Some(FreshnessResult {
				is_fresh: true,
				last_checked: 1_700_000_000
			})
		);
	}

	#[tokio::test]
	async fn test_invalid_pass_skips_freshness() {
		let mut mock = MockDeliveryInterface::new();
		reads(&mut mock).verification(false, sample_pass());
		mock.expect_call()
			.withf(|call| call.data.starts_with(&IResidencyPass::getPDPFreshnessCall::SELECTOR))
			.never();
		let h = harness(mock, Arc::new(AutoApprove));

		let report = service(&h).report_input("5").await.unwrap();
		assert!(!report.result.is_valid);
		assert_eq!(report.freshness, None);
	}

	#[tokio::test]
	async fn test_verifying_twice_gives_same_result() {
		let mut mock = MockDeliveryInterface::new();
		reads(&mut mock)
			.verification(true, sample_pass())
			.freshness(vec![(false, 0)]);
		let h = harness(mock, Arc::new(AutoApprove));
		let service = service(&h);

		let first = service.report_input("2").await.unwrap();
		let second = service.report_input("2").await.unwrap();
		assert_eq!(first, second);
	}

	#[tokio::test]
	async fn test_refresh_pays_pdp_fee_and_requeries() {
		let mut mock = MockDeliveryInterface::new();
		reads(&mut mock)
			.freshness_fee(U256::from(1_000))
			.freshness(vec![(true, 1_800_000_000)]);
		mock.expect_submit()
			.withf(|tx| {
				tx.value == U256::from(1_000)
					&& tx.data.starts_with(&IResidencyPass::triggerPDPCheckCall::SELECTOR)
			})
			.times(1)
			.returning(|_| Ok(TransactionHash(B256::repeat_byte(0x0f))));
		mock.expect_wait_for_confirmation()
			.times(1)
			.returning(|hash, _| Ok(mined(*hash, true, vec![])));
		let h = harness(mock, Arc::new(AutoApprove));

		let freshness = service(&h)
			.refresh_freshness(&PassId::try_from(1).unwrap())
			.await
			.unwrap();
		assert!(freshness.is_fresh);
		assert_eq!(h.history.list().await[0].description, REFRESH_DESCRIPTION);
	}
}
