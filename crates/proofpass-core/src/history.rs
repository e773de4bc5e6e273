//! Locally persisted transaction history.
//!
//! The whole list lives under one storage key, newest first. Reads of a
//! missing or unreadable list yield an empty history; failed writes are
//! logged and otherwise ignored so a storage problem never blocks a
//! transaction.

use proofpass_storage::StorageService;
use proofpass_types::{StorageKey, TransactionHash, TransactionRecord, TransactionStatus};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;

pub struct TransactionHistory {
	storage: Arc<StorageService>,
	/// Serializes read-modify-write cycles.
	write_lock: Mutex<()>,
}

impl TransactionHistory {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self {
			storage,
			write_lock: Mutex::new(()),
		}
	}

	/// All records, newest first.
	pub async fn list(&self) -> Vec<TransactionRecord> {
		match self
			.storage
			.load::<Vec<TransactionRecord>>(StorageKey::Transactions)
			.await
		{
			Ok(records) => records.unwrap_or_default(),
			Err(e) => {
				error!(error = %e, "Failed to load transaction history");
				Vec::new()
			},
		}
	}

	/// Records a freshly submitted transaction as pending.
	pub async fn add(&self, hash: TransactionHash, description: &str) {
		let _guard = self.write_lock.lock().await;
		let mut records = self.list().await;
		records.insert(0, TransactionRecord::pending(hash, description));
		self.persist(&records).await;
	}

	/// Sets the status of the record with `hash`, if there is one.
	pub async fn update_status(&self, hash: &TransactionHash, status: TransactionStatus) {
		let _guard = self.write_lock.lock().await;
		let mut records = self.list().await;
		let Some(record) = records.iter_mut().find(|record| record.hash == *hash) else {
			return;
		};
		record.status = status;
		self.persist(&records).await;
	}

	pub async fn clear(&self) {
		let _guard = self.write_lock.lock().await;
		if let Err(e) = self.storage.remove(StorageKey::Transactions).await {
			error!(error = %e, "Failed to clear transaction history");
		}
	}

	async fn persist(&self, records: &[TransactionRecord]) {
		if let Err(e) = self.storage.save(StorageKey::Transactions, &records).await {
			error!(error = %e, "Failed to save transaction history");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proofpass_storage::implementations::memory::MemoryStorage;
	use proofpass_types::B256;

	fn history() -> TransactionHistory {
		TransactionHistory::new(Arc::new(StorageService::new(Box::new(MemoryStorage::new()))))
	}

	fn hash(byte: u8) -> TransactionHash {
		TransactionHash(B256::repeat_byte(byte))
	}

	#[tokio::test]
	async fn test_empty_history() {
		assert!(history().list().await.is_empty());
	}

	#[tokio::test]
	async fn test_newest_first() {
		let history = history();
		history.add(hash(1), "Issue Residency Pass").await;
		history.add(hash(2), "Trigger PDP Check").await;

		let records = history.list().await;
		assert_eq!(records.len(), 2);
		assert_eq!(records[0].hash, hash(2));
		assert_eq!(records[1].description, "Issue Residency Pass");
		assert!(records.iter().all(|r| r.status == TransactionStatus::Pending));
	}

	#[tokio::test]
	async fn test_update_status() {
		let history = history();
		history.add(hash(1), "a").await;
		history.add(hash(2), "b").await;
		history.update_status(&hash(1), TransactionStatus::Success).await;
		history.update_status(&hash(9), TransactionStatus::Error).await;

		let records = history.list().await;
		assert_eq!(records[0].status, TransactionStatus::Pending);
		assert_eq!(records[1].status, TransactionStatus::Success);
	}

	#[tokio::test]
	async fn test_clear() {
		let history = history();
		history.add(hash(1), "a").await;
		history.clear().await;
		assert!(history.list().await.is_empty());
	}
}
