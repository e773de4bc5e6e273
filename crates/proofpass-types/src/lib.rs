//! Common types module for the ProofPass client.
//!
//! This module defines the data types shared by every ProofPass crate:
//! residency pass records, transaction receipts and records, the contract
//! ABI bindings and the configuration validation framework.

/// Contract ABI bindings for the ResidencyPass, NotaryRegistry and SPJurisdiction contracts.
pub mod contracts;
/// Transaction delivery types for blockchain interactions.
pub mod delivery;
/// Transaction history records persisted between sessions.
pub mod history;
/// Network configuration for the chain the client talks to.
pub mod networks;
/// Residency pass records and identifiers.
pub mod pass;
/// Self-registering implementation registry.
pub mod registry;
/// Secret string wrapper for private keys.
pub mod secret_string;
/// Storage keys for persisted data.
pub mod storage;
/// Formatting and parsing helpers.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

pub use alloy_primitives::{Address, Bytes, B256, U256};
pub use delivery::*;
pub use history::*;
pub use networks::NetworkConfig;
pub use pass::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use storage::*;
pub use utils::{
	current_timestamp, format_elapsed, format_token_amount, shorten_address, with_0x_prefix,
	without_0x_prefix,
};
pub use validation::*;
