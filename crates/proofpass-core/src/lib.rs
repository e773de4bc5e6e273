//! Core client logic for ProofPass.
//!
//! This crate ties the pluggable services (storage, wallet account, chain
//! delivery) together and implements the flows on top of them: fee reads,
//! pass issuance with receipt decoding, verification and freshness refresh,
//! notary and jurisdiction administration, and the local transaction
//! history. A [`ProofPassContext`] is built once by [`ProofPassBuilder`] and
//! hands out the per-flow services.

use proofpass_account::AccountService;
use proofpass_config::Config;
use proofpass_delivery::DeliveryService;
use proofpass_types::Address;
use std::sync::Arc;
use std::time::Duration;

pub mod builder;
pub mod clipboard;
pub mod dashboard;
pub mod fees;
pub mod history;
pub mod issuance;
pub mod jurisdiction;
pub mod network;
pub mod notary;
pub mod query;
pub mod receipt;
pub mod submitter;
pub mod verify;

#[cfg(test)]
mod test_support;

pub use builder::{BuilderError, ProofPassBuilder, ProofPassFactories};
pub use clipboard::{Clipboard, ClipboardError, MemoryClipboard};
pub use dashboard::{contracts_overview, ContractEntry, ContractsOverview};
pub use fees::{FeeReader, FeeState};
pub use history::TransactionHistory;
pub use issuance::{FlowError, IssuanceFlow, IssuanceStep};
pub use jurisdiction::{JurisdictionClient, JurisdictionRegistration};
pub use network::NetworkStatus;
pub use notary::NotaryRegistryClient;
pub use query::{QueryClient, QueryError};
pub use receipt::{extract_pass_id, ExtractionOutcome};
pub use submitter::{
	ApprovalRequest, AutoApprove, ContractWrite, SubmissionError, SubmissionState,
	TransactionApprover, TransactionSubmitter,
};
pub use verify::{pass_id_from_link, share_link, VerificationReport, VerificationService, VerifyError};

/// Everything the flows need, built once at startup.
///
/// Holds the configured services and the single transaction submitter, so
/// every flow obtained from the same context shares one in-flight guard and
/// one history.
pub struct ProofPassContext {
	config: Config,
	account: Option<Arc<AccountService>>,
	delivery: Arc<DeliveryService>,
	query: Arc<QueryClient>,
	history: Arc<TransactionHistory>,
	submitter: Arc<TransactionSubmitter>,
}

impl ProofPassContext {
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// The connected wallet, if any.
	pub fn account(&self) -> Option<&Arc<AccountService>> {
		self.account.as_ref()
	}

	pub fn history(&self) -> &Arc<TransactionHistory> {
		&self.history
	}

	pub async fn connected_address(&self) -> Result<Address, SubmissionError> {
		self.submitter.connected_address().await
	}

	pub fn fee_reader(&self) -> FeeReader {
		FeeReader::new(self.query.clone(), self.config.contracts.residency_pass)
	}

	/// A fresh issuance flow, starting at Upload.
	pub fn issuance_flow(&self, clipboard: Arc<dyn Clipboard>) -> IssuanceFlow {
		IssuanceFlow::new(
			&self.config,
			self.fee_reader(),
			self.submitter.clone(),
			clipboard,
		)
	}

	pub fn verification(&self) -> VerificationService {
		VerificationService::new(
			self.query.clone(),
			self.submitter.clone(),
			self.config.contracts.residency_pass,
			Duration::from_secs(self.config.verification.refresh_delay_seconds),
		)
	}

	pub fn notary_registry(&self) -> NotaryRegistryClient {
		NotaryRegistryClient::new(
			self.query.clone(),
			self.submitter.clone(),
			self.config.contracts.notary_registry,
		)
	}

	pub fn jurisdiction(&self) -> JurisdictionClient {
		JurisdictionClient::new(
			self.query.clone(),
			self.submitter.clone(),
			self.config.contracts.sp_jurisdiction,
		)
	}

	pub async fn network_status(&self) -> NetworkStatus {
		network::check_network(&self.delivery, &self.config.network).await
	}

	pub async fn contracts_overview(&self) -> ContractsOverview {
		dashboard::contracts_overview(&self.config, self.query.clone()).await
	}

	/// Releases the services. A transaction still awaiting confirmation is
	/// not cancelled; it stays pending in the history.
	pub async fn shutdown(self) {
		if self.submitter.is_busy() {
			tracing::warn!("Shutting down while a transaction is still in flight");
		}
		let pending = self
			.history
			.list()
			.await
			.into_iter()
			.filter(|record| record.status == proofpass_types::TransactionStatus::Pending)
			.count();
		tracing::info!(pending_transactions = pending, "ProofPass context shut down");
	}
}
