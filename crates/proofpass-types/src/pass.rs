//! Residency pass types.
//!
//! A pass is an on-chain record keyed by an integer identifier. The client
//! only ever reads passes; issuance and freshness refresh happen through
//! contract calls.

use crate::contracts::IResidencyPass;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of a residency pass. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PassId(U256);

/// Errors produced when user input cannot be turned into a [`PassId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PassIdError {
	#[error("Please enter a Pass ID to verify")]
	Missing,
	#[error("Please enter a valid Pass ID number")]
	NotANumber,
	#[error("Pass ID must be a positive number")]
	NotPositive,
}

impl PassId {
	/// Wraps a raw identifier, rejecting zero.
	pub fn new(value: U256) -> Option<Self> {
		if value.is_zero() {
			None
		} else {
			Some(Self(value))
		}
	}

	pub fn as_u256(&self) -> U256 {
		self.0
	}
}

impl fmt::Display for PassId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl TryFrom<u64> for PassId {
	type Error = PassIdError;

	fn try_from(value: u64) -> Result<Self, Self::Error> {
		Self::new(U256::from(value)).ok_or(PassIdError::NotPositive)
	}
}

impl FromStr for PassId {
	type Err = PassIdError;

	fn from_str(input: &str) -> Result<Self, Self::Err> {
		let trimmed = input.trim();
		if trimmed.is_empty() {
			return Err(PassIdError::Missing);
		}

		if let Some(rest) = trimmed.strip_prefix('-') {
			if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit() || c == '.') {
				return Err(PassIdError::NotPositive);
			}
			return Err(PassIdError::NotANumber);
		}

		if !trimmed.chars().all(|c| c.is_ascii_digit()) {
			return Err(PassIdError::NotANumber);
		}

		let value = U256::from_str_radix(trimmed, 10).map_err(|_| PassIdError::NotANumber)?;
		Self::new(value).ok_or(PassIdError::NotPositive)
	}
}

/// Pass fields as returned by `verifyResidency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassRecord {
	pub country: String,
	pub region: String,
	pub document_cid: String,
	pub metadata_cid: String,
	/// Expiry as a Unix timestamp in seconds.
	pub expiry: U256,
	pub issuer: Address,
}

impl From<IResidencyPass::Pass> for PassRecord {
	fn from(pass: IResidencyPass::Pass) -> Self {
		Self {
			country: pass.country,
			region: pass.region,
			document_cid: pass.docCID,
			metadata_cid: pass.metaCID,
			expiry: pass.expiry,
			issuer: pass.issuer,
		}
	}
}

/// Live result of `verifyResidency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
	pub is_valid: bool,
	pub pass: PassRecord,
}

/// Live result of `getPDPFreshness`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessResult {
	pub is_fresh: bool,
	/// Unix timestamp of the last data-possession check, zero if never checked.
	pub last_checked: u64,
}

impl FreshnessResult {
	/// Seconds elapsed since the last check, if there has been one.
	pub fn seconds_since_check(&self, now: u64) -> Option<u64> {
		if self.last_checked == 0 {
			None
		} else {
			Some(now.saturating_sub(self.last_checked))
		}
	}
}
