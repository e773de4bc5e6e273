//! Keys under which the client persists data.

/// Storage keys for different data collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Ordered list of submitted transactions, newest first.
	Transactions,
}

impl StorageKey {
	/// The key as written to the storage backend.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Transactions => "proofpass_transactions",
		}
	}
}
