//! Transaction delivery types for the ProofPass client.
//!
//! This module defines types related to blockchain transaction submission
//! and monitoring, including transaction hashes, receipts and their logs.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Blockchain transaction hash representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionHash(pub B256);

impl fmt::Display for TransactionHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{:#x}", self.0)
	}
}

impl From<B256> for TransactionHash {
	fn from(hash: B256) -> Self {
		Self(hash)
	}
}

/// A transaction ready to be signed by the connected wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
	/// Chain the transaction is meant for.
	pub chain_id: u64,
	/// Contract being called.
	pub to: Address,
	/// ABI-encoded calldata.
	pub data: Bytes,
	/// Native value attached to the call, in the smallest unit.
	pub value: U256,
}

/// Read-only contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
	pub to: Address,
	pub data: Bytes,
}

/// A raw log entry emitted by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
	/// Contract that emitted the log.
	pub address: Address,
	/// Indexed topics; topic 0 is the event signature hash for non-anonymous events.
	pub topics: Vec<B256>,
	/// Non-indexed ABI-encoded payload.
	pub data: Bytes,
}

/// Transaction receipt containing execution details.
///
/// Provides information about a transaction after it has been included in a block,
/// including its success status and the logs it emitted, in receipt order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
	/// The hash of the transaction.
	pub hash: TransactionHash,
	/// The block number where the transaction was included.
	pub block_number: u64,
	/// Whether the transaction executed successfully.
	pub success: bool,
	/// Logs emitted by the transaction.
	pub logs: Vec<EventLog>,
}
