//! Terminal consent surface answering broker requests from stdin.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::adapters::live::documents::LiveDocumentTree;
use crate::consent::ConsentRequest;
use crate::error::ErrorCode;
use crate::ports::consent::{CapabilityGrant, DirectoryGrant};

const CAPABILITY_PROMPT: &str = "Allow read access to shared storage? [y/N] ";
const DIRECTORY_PROMPT: &str = "Choose a directory for the device id (blank to cancel): ";

/// Reads one answer for a prompt. `Ok(None)` means end of input.
pub type AskFn = dyn Fn(&str) -> io::Result<Option<String>> + Send + Sync;

/// Consent surface that prompts on the terminal.
///
/// Each prompt runs on a blocking thread so the async runtime keeps going
/// while the user types.
pub struct TerminalConsentSurface {
    ask: Arc<AskFn>,
}

impl TerminalConsentSurface {
    /// Surface reading answers from stdin and prompting on stderr.
    #[must_use]
    pub fn stdin() -> Self {
        Self { ask: Arc::new(ask_stdin) }
    }

    /// Surface with a custom answer source.
    #[must_use]
    pub fn with_answers(ask: Arc<AskFn>) -> Self {
        Self { ask }
    }

    /// Answers requests until the broker side of the channel is dropped.
    pub async fn serve(self, mut requests: mpsc::UnboundedReceiver<ConsentRequest>) {
        while let Some(request) = requests.recv().await {
            debug!(request_id = request.id(), kind = ?request.kind(), "consent prompt");
            match request {
                ConsentRequest::StorageCapability { reply, .. } => {
                    let grant = match self.ask(CAPABILITY_PROMPT).await {
                        Ok(Some(line)) => parse_capability_answer(&line),
                        Ok(None) => CapabilityGrant::Denied,
                        Err(e) => {
                            warn!(error = %e, "capability prompt failed");
                            CapabilityGrant::Denied
                        }
                    };
                    let _ = reply.send(grant);
                }
                ConsentRequest::DirectoryGrant { reply, .. } => {
                    let grant = match self.ask(DIRECTORY_PROMPT).await {
                        Ok(Some(line)) => parse_directory_answer(&line),
                        Ok(None) => DirectoryGrant::Cancelled,
                        Err(e) => {
                            DirectoryGrant::Error { code: ErrorCode::Saf, message: e.to_string() }
                        }
                    };
                    let _ = reply.send(grant);
                }
            }
        }
    }

    async fn ask(&self, prompt: &'static str) -> io::Result<Option<String>> {
        let ask = Arc::clone(&self.ask);
        tokio::task::spawn_blocking(move || ask(prompt)).await.map_err(io::Error::other)?
    }
}

fn ask_stdin(prompt: &str) -> io::Result<Option<String>> {
    let mut stderr = io::stderr();
    stderr.write_all(prompt.as_bytes())?;
    stderr.flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

/// Interprets a yes/no answer; anything but an explicit yes denies.
#[must_use]
pub fn parse_capability_answer(line: &str) -> CapabilityGrant {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => CapabilityGrant::Granted,
        _ => CapabilityGrant::Denied,
    }
}

/// Interprets a directory answer; blank cancels.
#[must_use]
pub fn parse_directory_answer(line: &str) -> DirectoryGrant {
    let answer = line.trim();
    if answer.is_empty() {
        DirectoryGrant::Cancelled
    } else if answer.starts_with("file://") {
        DirectoryGrant::Granted(answer.to_string())
    } else {
        DirectoryGrant::Granted(LiveDocumentTree::tree_uri(Path::new(answer)))
    }
}
