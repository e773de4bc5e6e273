//! String formatting for terminal output.

/// Shortens an address or hash to `0x1234...abcd` form, keeping `chars`
/// hex digits on each side. Short inputs are returned unchanged.
pub fn shorten_address(address: &str, chars: usize) -> String {
	let body = without_0x_prefix(address);
	if body.len() <= chars * 2 || !body.is_ascii() {
		return address.to_string();
	}
	format!("0x{}...{}", &body[..chars], &body[body.len() - chars..])
}

/// Adds a "0x" prefix unless one (of either case) is already present.
pub fn with_0x_prefix(hex_str: &str) -> String {
	if hex_str.starts_with("0x") || hex_str.starts_with("0X") {
		hex_str.to_string()
	} else {
		format!("0x{}", hex_str)
	}
}

/// Strips a leading "0x" or "0X".
pub fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

/// Renders a raw base-unit amount (decimal string) with `decimals` places,
/// dropping trailing zeros: "1500000000000000000" at 18 decimals is "1.5".
pub fn format_token_amount(amount: &str, decimals: u8) -> String {
	let places = decimals as usize;
	if places == 0 {
		return amount.to_string();
	}

	let padded = format!("{:0>width$}", amount, width = places + 1);
	let (whole, fraction) = padded.split_at(padded.len() - places);
	let fraction = fraction.trim_end_matches('0');

	if fraction.is_empty() {
		whole.to_string()
	} else {
		format!("{}.{}", whole, fraction)
	}
}

/// Human-friendly elapsed time: "45s ago", "12m ago", "3h ago", "2d ago".
pub fn format_elapsed(seconds: u64) -> String {
	match seconds {
		0..=59 => format!("{}s ago", seconds),
		60..=3_599 => format!("{}m ago", seconds / 60),
		3_600..=86_399 => format!("{}h ago", seconds / 3_600),
		_ => format!("{}d ago", seconds / 86_400),
	}
}
