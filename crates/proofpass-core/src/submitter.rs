//! Contract writes through the connected wallet.
//!
//! One write at a time: a submit while another is in flight fails with
//! [`SubmissionError::Busy`]. Every accepted transaction is recorded in the
//! history as pending and updated once its receipt resolves. Writes are
//! never retried.

use crate::history::TransactionHistory;
use async_trait::async_trait;
use proofpass_account::AccountService;
use proofpass_delivery::DeliveryService;
use proofpass_types::{
	Address, Bytes, Transaction, TransactionHash, TransactionReceipt, TransactionStatus, U256,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

/// Wallet wording for a declined signature request.
pub const USER_REJECTED_MESSAGE: &str = "User rejected the request.";

/// Why a write did not produce a successful receipt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
	#[error("Please connect your wallet first")]
	WalletNotConnected,
	#[error("Another transaction is already in progress")]
	Busy,
	#[error("Transaction was rejected in your wallet")]
	UserRejected,
	#[error("Insufficient funds to cover the fee and gas")]
	InsufficientFunds,
	#[error("Transaction failed: {0}")]
	Failed(String),
	#[error("Transaction {hash} reverted")]
	Reverted { hash: TransactionHash },
}

impl SubmissionError {
	/// Maps a wallet or node error message onto a kind.
	pub fn classify(message: &str) -> Self {
		let lower = message.to_lowercase();
		if lower.contains("user rejected") || lower.contains("user denied") {
			SubmissionError::UserRejected
		} else if lower.contains("insufficient funds") {
			SubmissionError::InsufficientFunds
		} else {
			SubmissionError::Failed(message.to_string())
		}
	}
}

/// Observable progress of the current write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
	Idle,
	AwaitingSignature,
	AwaitingConfirmation { hash: TransactionHash },
	Confirmed { receipt: TransactionReceipt },
	Reverted { receipt: TransactionReceipt },
	Rejected { error: SubmissionError },
}

/// A contract call with typed arguments already ABI-encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractWrite {
	pub to: Address,
	pub calldata: Bytes,
	/// Payment attached to the call.
	pub value: U256,
	/// Label used in the transaction history.
	pub description: String,
}

/// What the wallet shows when asking for a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRequest {
	pub from: Address,
	pub to: Address,
	pub value: U256,
	pub chain_id: u64,
	pub description: String,
}

/// Stands in for the wallet's signature prompt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionApprover: Send + Sync {
	/// Returns `false` when the user declines.
	async fn approve(&self, request: &ApprovalRequest) -> bool;
}

/// Approves every request.
pub struct AutoApprove;

#[async_trait]
impl TransactionApprover for AutoApprove {
	async fn approve(&self, _request: &ApprovalRequest) -> bool {
		true
	}
}

/// Clears the in-flight flag when the submission ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::SeqCst);
	}
}

pub struct TransactionSubmitter {
	delivery: Arc<DeliveryService>,
	account: Option<Arc<AccountService>>,
	approver: Arc<dyn TransactionApprover>,
	history: Arc<TransactionHistory>,
	chain_id: u64,
	in_flight: AtomicBool,
	state: watch::Sender<SubmissionState>,
}

impl TransactionSubmitter {
	pub fn new(
		delivery: Arc<DeliveryService>,
		account: Option<Arc<AccountService>>,
		approver: Arc<dyn TransactionApprover>,
		history: Arc<TransactionHistory>,
		chain_id: u64,
	) -> Self {
		let (state, _) = watch::channel(SubmissionState::Idle);
		Self {
			delivery,
			account,
			approver,
			history,
			chain_id,
			in_flight: AtomicBool::new(false),
			state,
		}
	}

	pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
		self.state.subscribe()
	}

	pub fn state(&self) -> SubmissionState {
		self.state.borrow().clone()
	}

	pub fn is_busy(&self) -> bool {
		self.in_flight.load(Ordering::SeqCst)
	}

	/// Back to `Idle`, unless a write is in flight.
	pub fn reset(&self) {
		if !self.is_busy() {
			self.state.send_replace(SubmissionState::Idle);
		}
	}

	/// Address of the connected wallet.
	pub async fn connected_address(&self) -> Result<Address, SubmissionError> {
		let account = self
			.account
			.as_ref()
			.ok_or(SubmissionError::WalletNotConnected)?;
		account.get_address().await.map_err(|e| {
			warn!(error = %e, "Connected account has no usable address");
			SubmissionError::WalletNotConnected
		})
	}

	/// Sends `write` and waits for its receipt.
	///
	/// Returns the receipt only if the transaction executed successfully.
	#[instrument(skip_all, fields(to = %write.to, description = %write.description))]
	pub async fn submit(&self, write: ContractWrite) -> Result<TransactionReceipt, SubmissionError> {
		let from = self.connected_address().await?;

		if self
			.in_flight
			.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
			.is_err()
		{
			return Err(SubmissionError::Busy);
		}
		let _in_flight = InFlight(&self.in_flight);

		self.state.send_replace(SubmissionState::AwaitingSignature);
		let request = ApprovalRequest {
			from,
			to: write.to,
			value: write.value,
			chain_id: self.chain_id,
			description: write.description.clone(),
		};
		if !self.approver.approve(&request).await {
			return Err(self.reject(SubmissionError::classify(USER_REJECTED_MESSAGE)));
		}

		let tx = Transaction {
			chain_id: self.chain_id,
			to: write.to,
			data: write.calldata,
			value: write.value,
		};
		let hash = match self.delivery.deliver(tx).await {
			Ok(hash) => hash,
			Err(e) => return Err(self.reject(SubmissionError::classify(&e.to_string()))),
		};

		info!(tx_hash = %hash, "Transaction submitted");
		self.history.add(hash, &write.description).await;
		self.state
			.send_replace(SubmissionState::AwaitingConfirmation { hash });

		let receipt = match self.delivery.confirm_with_default(&hash).await {
			Ok(receipt) => receipt,
			Err(e) => {
				self.history
					.update_status(&hash, TransactionStatus::Error)
					.await;
				return Err(self.reject(SubmissionError::Failed(e.to_string())));
			},
		};

		if receipt.success {
			info!(tx_hash = %hash, block = receipt.block_number, "Transaction confirmed");
			self.history
				.update_status(&hash, TransactionStatus::Success)
				.await;
			self.state.send_replace(SubmissionState::Confirmed {
				receipt: receipt.clone(),
			});
			Ok(receipt)
		} else {
			warn!(tx_hash = %hash, block = receipt.block_number, "Transaction reverted");
			self.history
				.update_status(&hash, TransactionStatus::Error)
				.await;
			self.state.send_replace(SubmissionState::Reverted { receipt });
			Err(SubmissionError::Reverted { hash })
		}
	}

	fn reject(&self, error: SubmissionError) -> SubmissionError {
		warn!(error = %error, "Transaction not completed");
		self.state.send_replace(SubmissionState::Rejected {
			error: error.clone(),
		});
		error
	}
}
