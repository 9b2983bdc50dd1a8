//! Generation backend adapter.
//!
//! The single point of contact with the text-generation backend. Every
//! call is bounded by the configured timeout, and every outcome, good or
//! bad, comes back as text so the wire protocol stays uniform.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{instrument, warn};

use crate::backend::{BackendError, BackendOutput, GenerationBackend};

/// Returned when the backend program cannot be located or started.
pub const NOT_AVAILABLE_NOTICE: &str = "Cloud server response: I'm running in cloud mode without LLM. For complex queries, please ensure Ollama is installed on the server.";

const NO_RESPONSE: &str = "No response from LLM";

static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("valid blank-line regex"));

/// Why a generation call produced no usable text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    NotAvailable,
    TimedOut(Duration),
    /// Non-zero exit or empty output; carries the backend's error text.
    NonZeroExit(String),
    Other(String),
}

/// Result of one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Text(String),
    Failure(FailureReason),
}

impl GenerationOutcome {
    /// Render the outcome as the text sent back to the device.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Failure(FailureReason::NotAvailable) => NOT_AVAILABLE_NOTICE.to_string(),
            Self::Failure(FailureReason::TimedOut(after)) => format!(
                "Error: LLM request timed out ({} seconds).",
                after.as_secs()
            ),
            Self::Failure(FailureReason::NonZeroExit(detail)) => {
                format!("Error from LLM: {detail}")
            }
            Self::Failure(FailureReason::Other(detail)) => format!("Error calling LLM: {detail}"),
        }
    }
}

/// Wraps a [`GenerationBackend`] with a timeout and output normalization.
pub struct Generator<B> {
    backend: B,
    timeout: Duration,
}

impl<B: GenerationBackend> Generator<B> {
    pub const fn new(backend: B, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Generate text for `prompt`. Never fails; failures become notices.
    pub async fn generate(&self, prompt: &str) -> String {
        self.outcome(prompt).await.into_text()
    }

    /// Generate text for `prompt`, keeping the failure reason structured.
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len(), timeout = ?self.timeout))]
    pub async fn outcome(&self, prompt: &str) -> GenerationOutcome {
        let Ok(result) = tokio::time::timeout(self.timeout, self.backend.generate(prompt)).await
        else {
            warn!("Generation backend timed out");
            return GenerationOutcome::Failure(FailureReason::TimedOut(self.timeout));
        };

        match result {
            Ok(output) => interpret(output),
            Err(BackendError::NotAvailable(detail)) => {
                warn!(%detail, "Generation backend not available");
                GenerationOutcome::Failure(FailureReason::NotAvailable)
            }
            Err(e) => {
                warn!(error = %e, "Generation backend failed");
                GenerationOutcome::Failure(FailureReason::Other(e.to_string()))
            }
        }
    }
}

fn interpret(output: BackendOutput) -> GenerationOutcome {
    let text = collapse_blank_lines(&output.stdout);
    if output.exit_code == 0 && !text.is_empty() {
        return GenerationOutcome::Text(text);
    }

    warn!(exit_code = output.exit_code, "Generation backend returned no text");
    let stderr = output.stderr.trim();
    let detail = if stderr.is_empty() { NO_RESPONSE } else { stderr };
    GenerationOutcome::Failure(FailureReason::NonZeroExit(detail.to_string()))
}

/// Collapse runs of blank lines into a single blank line and trim.
pub fn collapse_blank_lines(text: &str) -> String {
    BLANK_LINES.replace_all(text, "\n\n").trim().to_string()
}
