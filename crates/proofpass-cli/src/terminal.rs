//! Terminal stand-ins for the wallet prompt and the system clipboard.

use async_trait::async_trait;
use proofpass_core::{ApprovalRequest, Clipboard, ClipboardError, TransactionApprover};
use proofpass_types::{format_token_amount, NetworkConfig};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

/// Asks on the terminal before every signature.
pub struct PromptApprover<R> {
	input: Mutex<R>,
	network: NetworkConfig,
}

impl PromptApprover<BufReader<Stdin>> {
	pub fn stdin(network: NetworkConfig) -> Self {
		Self::new(BufReader::new(tokio::io::stdin()), network)
	}
}

impl<R> PromptApprover<R> {
	pub fn new(input: R, network: NetworkConfig) -> Self {
		Self {
			input: Mutex::new(input),
			network,
		}
	}

	fn question(&self, request: &ApprovalRequest) -> String {
		format!(
			"{}\n  from:  {}\n  to:    {}\n  value: {} {}\n  chain: {}\nSign this transaction? [y/N] ",
			request.description,
			request.from,
			request.to,
			format_token_amount(&request.value.to_string(), self.network.currency_decimals),
			self.network.currency_symbol,
			request.chain_id,
		)
	}
}

#[async_trait]
impl<R> TransactionApprover for PromptApprover<R>
where
	R: AsyncBufRead + Unpin + Send,
{
	async fn approve(&self, request: &ApprovalRequest) -> bool {
		eprint!("{}", self.question(request));

		let mut answer = String::new();
		let mut input = self.input.lock().await;
		match input.read_line(&mut answer).await {
			Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
			Err(e) => {
				tracing::warn!(error = %e, "Could not read the approval answer");
				false
			},
		}
	}
}

/// Writes copied text to a file, replacing its content.
pub struct FileClipboard {
	path: PathBuf,
}

impl FileClipboard {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

impl Clipboard for FileClipboard {
	fn copy(&self, text: &str) -> Result<(), ClipboardError> {
		std::fs::write(&self.path, text)
			.map_err(|e| ClipboardError(format!("{}: {}", self.path.display(), e)))
	}
}

/// Used when no copy target was given; copying only logs.
pub struct NoClipboard;

impl Clipboard for NoClipboard {
	fn copy(&self, text: &str) -> Result<(), ClipboardError> {
		tracing::debug!(text, "No clipboard target, nothing copied");
		Ok(())
	}
}
