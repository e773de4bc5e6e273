//! Display and parsing helpers shared by the CLI and core crates.

pub mod formatting;
pub mod helpers;

pub use formatting::{
	format_elapsed, format_token_amount, shorten_address, with_0x_prefix, without_0x_prefix,
};
pub use helpers::current_timestamp;
