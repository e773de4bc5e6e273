//! Shared fixtures for unit tests: mocked chain reads, receipts and a
//! submitter wired to an in-memory history.

use crate::history::TransactionHistory;
use crate::query::QueryClient;
use crate::submitter::{TransactionApprover, TransactionSubmitter};
use alloy_sol_types::{SolCall, SolEvent};
use proofpass_account::implementations::local;
use proofpass_account::AccountService;
use proofpass_config::builders::{ConfigBuilder, TEST_PRIVATE_KEY};
use proofpass_config::Config;
use proofpass_delivery::{DeliveryService, MockDeliveryInterface};
use proofpass_storage::implementations::memory::MemoryStorage;
use proofpass_storage::StorageService;
use proofpass_types::contracts::{INotaryRegistry, IResidencyPass, ISPJurisdiction};
use proofpass_types::{
	Address, Bytes, EventLog, TransactionHash, TransactionReceipt, B256, U256,
};
use std::sync::Arc;

/// Address of the first anvil account, derived from [`TEST_PRIVATE_KEY`].
pub const TEST_ADDRESS: Address = Address::new([
	0xf3, 0x9f, 0xd6, 0xe5, 0x1a, 0xad, 0x88, 0xf6, 0xf4, 0xce, 0x6a, 0xb8, 0x82, 0x72, 0x79, 0xcf,
	0xff, 0xb9, 0x22, 0x66,
]);

pub fn config() -> Config {
	ConfigBuilder::new().build()
}

pub fn delivery(mock: MockDeliveryInterface) -> Arc<DeliveryService> {
	Arc::new(DeliveryService::new(Box::new(mock), 1))
}

pub fn query_client(mock: MockDeliveryInterface) -> Arc<QueryClient> {
	Arc::new(QueryClient::new(delivery(mock), config().query))
}

pub fn account() -> Arc<AccountService> {
	let mut table = toml::Table::new();
	table.insert(
		"private_key".to_string(),
		toml::Value::String(TEST_PRIVATE_KEY.to_string()),
	);
	let wallet = local::create_account(&toml::Value::Table(table)).expect("test key is valid");
	Arc::new(AccountService::new(wallet))
}

pub fn memory_history() -> Arc<TransactionHistory> {
	Arc::new(TransactionHistory::new(Arc::new(StorageService::new(
		Box::new(MemoryStorage::new()),
	))))
}

pub fn submitter_with(
	mock: MockDeliveryInterface,
	approver: Arc<dyn TransactionApprover>,
	history: Arc<TransactionHistory>,
) -> TransactionSubmitter {
	TransactionSubmitter::new(delivery(mock), Some(account()), approver, history, 314159)
}

/// Query client and submitter sharing one mocked transport.
pub struct Harness {
	pub config: Config,
	pub query: Arc<QueryClient>,
	pub submitter: Arc<TransactionSubmitter>,
	pub history: Arc<TransactionHistory>,
}

pub fn harness(mock: MockDeliveryInterface, approver: Arc<dyn TransactionApprover>) -> Harness {
	harness_with(config(), mock, approver)
}

pub fn harness_with(
	config: Config,
	mock: MockDeliveryInterface,
	approver: Arc<dyn TransactionApprover>,
) -> Harness {
	let delivery = delivery(mock);
	let history = memory_history();
	let account = config.account.as_ref().map(|_| account());
	Harness {
		query: Arc::new(QueryClient::new(delivery.clone(), config.query)),
		submitter: Arc::new(TransactionSubmitter::new(
			delivery,
			account,
			approver,
			history.clone(),
			config.network.chain_id,
		)),
		history,
		config,
	}
}

pub fn mined(hash: TransactionHash, success: bool, logs: Vec<EventLog>) -> TransactionReceipt {
	TransactionReceipt {
		hash,
		block_number: 100,
		success,
		logs,
	}
}

pub fn receipt_with(logs: Vec<EventLog>) -> TransactionReceipt {
	mined(TransactionHash(B256::repeat_byte(0xaa)), true, logs)
}

/// A well-formed `PassIssued` log as the ResidencyPass contract emits it.
pub fn pass_issued_log(pass_id: U256) -> EventLog {
	let event = IResidencyPass::PassIssued {
		passId: pass_id,
		to: TEST_ADDRESS,
		issuer: TEST_ADDRESS,
		country: "US".to_string(),
		region: "CA".to_string(),
		docCID: "docCID-placeholder".to_string(),
	};
	let encoded = event.encode_log_data();
	EventLog {
		address: Address::repeat_byte(0x11),
		topics: encoded.topics().to_vec(),
		data: encoded.data,
	}
}

pub fn sample_pass() -> IResidencyPass::Pass {
	IResidencyPass::Pass {
		country: "US".to_string(),
		region: "CA".to_string(),
		docCID: "docCID-placeholder".to_string(),
		metaCID: "metaCID-placeholder".to_string(),
		expiry: U256::from(1_900_000_000u64),
		issuer: TEST_ADDRESS,
	}
}

/// Registers canned answers for contract reads on a mock transport.
pub struct Reads<'a> {
	mock: &'a mut MockDeliveryInterface,
}

pub fn reads(mock: &mut MockDeliveryInterface) -> Reads<'_> {
	Reads { mock }
}

impl Reads<'_> {
	fn answer(self, selector: [u8; 4], data: Vec<u8>) -> Self {
		let data = Bytes::from(data);
		self.mock
			.expect_call()
			.withf(move |call| call.data.starts_with(&selector))
			.returning(move |_| Ok(data.clone()));
		self
	}

	pub fn issuance_fee(self, fee: U256) -> Self {
		self.answer(
			IResidencyPass::feeAmountCall::SELECTOR,
			IResidencyPass::feeAmountCall::abi_encode_returns(&(fee,)),
		)
	}

	pub fn freshness_fee(self, fee: U256) -> Self {
		self.answer(
			IResidencyPass::pdpFeeCall::SELECTOR,
			IResidencyPass::pdpFeeCall::abi_encode_returns(&(fee,)),
		)
	}

	pub fn verification(self, is_valid: bool, pass: IResidencyPass::Pass) -> Self {
		self.answer(
			IResidencyPass::verifyResidencyCall::SELECTOR,
			IResidencyPass::verifyResidencyCall::abi_encode_returns(&(is_valid, pass)),
		)
	}

	/// Answers freshness reads in order, repeating the last answer.
	pub fn freshness(self, answers: Vec<(bool, u64)>) -> Self {
		let mut index = 0;
		self.mock
			.expect_call()
			.withf(|call| call.data.starts_with(&IResidencyPass::getPDPFreshnessCall::SELECTOR))
			.returning(move |_| {
				let (is_fresh, last_checked) = answers[index.min(answers.len() - 1)];
				index += 1;
				Ok(IResidencyPass::getPDPFreshnessCall::abi_encode_returns(&(
					is_fresh,
					U256::from(last_checked),
				))
				.into())
			});
		self
	}

	pub fn notary(self, registered: bool, count: u64) -> Self {
		self.answer(
			INotaryRegistry::isNotaryCall::SELECTOR,
			INotaryRegistry::isNotaryCall::abi_encode_returns(&(registered,)),
		)
		.answer(
			INotaryRegistry::getNotaryCountCall::SELECTOR,
			INotaryRegistry::getNotaryCountCall::abi_encode_returns(&(U256::from(count),)),
		)
	}

	pub fn compliance(self, compliant: bool) -> Self {
		self.answer(
			ISPJurisdiction::isSPCompliantCall::SELECTOR,
			ISPJurisdiction::isSPCompliantCall::abi_encode_returns(&(compliant,)),
		)
	}
}
