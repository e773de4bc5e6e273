//! Transaction history records.
//!
//! Records are kept client-side only; they are never synchronized with the
//! chain or any server.

use crate::TransactionHash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resolution state of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
	Pending,
	Success,
	Error,
}

impl fmt::Display for TransactionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let label = match self {
			TransactionStatus::Pending => "pending",
			TransactionStatus::Success => "success",
			TransactionStatus::Error => "error",
		};
		f.write_str(label)
	}
}

/// One submitted transaction and its human-readable description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
	pub hash: TransactionHash,
	pub description: String,
	pub status: TransactionStatus,
}

impl TransactionRecord {
	/// Creates a record for a freshly submitted transaction.
	pub fn pending(hash: TransactionHash, description: impl Into<String>) -> Self {
		Self {
			hash,
			description: description.into(),
			status: TransactionStatus::Pending,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::B256;

	#[test]
	fn test_record_serializes_lowercase_status() {
		let record = TransactionRecord::pending(TransactionHash(B256::repeat_byte(0xab)), "Issue pass");
		let json = serde_json::to_value(&record).unwrap();
		assert_eq!(json["status"], "pending");
		assert_eq!(json["description"], "Issue pass");
		assert_eq!(
			json["hash"],
			"0xabababababababababababababababababababababababababababababababab"
		);
	}
}
