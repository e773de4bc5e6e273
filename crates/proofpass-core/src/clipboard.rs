//! Copy action for pass ids and share links.

use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Clipboard unavailable: {0}")]
pub struct ClipboardError(pub String);

/// Destination of "copy" actions.
pub trait Clipboard: Send + Sync {
	/// Replaces the clipboard content with exactly `text`.
	fn copy(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Keeps the last copied text in memory.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
	content: Mutex<Option<String>>,
}

impl MemoryClipboard {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn content(&self) -> Option<String> {
		self.content
			.lock()
			.map(|content| content.clone())
			.unwrap_or_default()
	}
}

impl Clipboard for MemoryClipboard {
	fn copy(&self, text: &str) -> Result<(), ClipboardError> {
		let mut content = self
			.content
			.lock()
			.map_err(|e| ClipboardError(e.to_string()))?;
		*content = Some(text.to_string());
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_copy_replaces_content() {
		let clipboard = MemoryClipboard::new();
		assert_eq!(clipboard.content(), None);
		clipboard.copy("1").unwrap();
		clipboard.copy("42").unwrap();
		assert_eq!(clipboard.content().as_deref(), Some("42"));
	}
}
