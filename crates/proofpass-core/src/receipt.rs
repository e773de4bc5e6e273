//! Recovers the minted pass id from an issuance receipt.
//!
//! Logs are scanned in receipt order and the first `PassIssued` wins. Each
//! log is first decoded against the ResidencyPass event set; when that fails
//! the log is matched by hand on its signature hash and the id is read from
//! the first indexed topic.

use alloy_primitives::keccak256;
use alloy_sol_types::SolEventInterface;
use once_cell::sync::Lazy;
use proofpass_types::contracts::IResidencyPass::IResidencyPassEvents;
use proofpass_types::{EventLog, PassId, TransactionReceipt, B256, U256};
use tracing::debug;

/// Canonical signature of the issuance event.
pub const PASS_ISSUED_SIGNATURE: &str = "PassIssued(uint256,address,address,string,string,string)";

/// keccak-256 of [`PASS_ISSUED_SIGNATURE`].
pub static PASS_ISSUED_TOPIC: Lazy<B256> = Lazy::new(|| keccak256(PASS_ISSUED_SIGNATURE));

/// How a single log was classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogMatch {
	/// A `PassIssued` event carrying this raw id.
	PassIssued(U256),
	/// Another ResidencyPass event.
	OtherEvent,
	/// Neither decoding path recognized the log.
	Unrecognized,
}

/// Result of scanning a whole receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionOutcome {
	Found(PassId),
	/// No `PassIssued` log, or one carrying a zero id.
	NotFound,
}

impl ExtractionOutcome {
	pub fn pass_id(&self) -> Option<PassId> {
		match self {
			ExtractionOutcome::Found(id) => Some(*id),
			ExtractionOutcome::NotFound => None,
		}
	}
}

/// Classifies one log, structured decoding first.
pub fn decode_log(log: &EventLog) -> LogMatch {
	match IResidencyPassEvents::decode_raw_log(&log.topics, &log.data, true) {
		Ok(IResidencyPassEvents::PassIssued(event)) => LogMatch::PassIssued(event.passId),
		Ok(_) => LogMatch::OtherEvent,
		Err(_) => decode_manually(log),
	}
}

/// Signature-hash match on the raw topics.
pub fn decode_manually(log: &EventLog) -> LogMatch {
	// signature plus three indexed parameters
	if log.topics.len() < 4 || log.topics[0] != *PASS_ISSUED_TOPIC {
		return LogMatch::Unrecognized;
	}
	LogMatch::PassIssued(U256::from_be_bytes(log.topics[1].0))
}

/// Finds the pass id minted by the transaction behind `receipt`.
///
/// A `PassIssued` log carrying id zero stops the scan with `NotFound`.
pub fn extract_pass_id(receipt: &TransactionReceipt) -> ExtractionOutcome {
	for (index, log) in receipt.logs.iter().enumerate() {
		match decode_log(log) {
			LogMatch::PassIssued(raw) => {
				debug!(tx_hash = %receipt.hash, log_index = index, pass_id = %raw, "Found PassIssued");
				return PassId::new(raw).map_or(ExtractionOutcome::NotFound, ExtractionOutcome::Found);
			},
			LogMatch::OtherEvent | LogMatch::Unrecognized => continue,
		}
	}

	debug!(tx_hash = %receipt.hash, logs = receipt.logs.len(), "No PassIssued event in receipt");
	ExtractionOutcome::NotFound
}
