//! Text-generation backend trait and implementations.
//!
//! A backend is a black box that turns a prompt into generated text.
//! Timeouts and output cleanup belong to the adapter in
//! [`crate::generation`]; backends only run the call and report what
//! happened.

mod command;

pub use command::CommandBackend;

use async_trait::async_trait;
use thiserror::Error;

/// Raw result of one backend invocation.
#[derive(Debug, Clone, Default)]
pub struct BackendOutput {
    /// Exit code of the process (0 = success).
    pub exit_code: i32,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

impl BackendOutput {
    /// Successful invocation with the given text on stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }
}

/// Failures that prevent a backend from producing an exit status.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend program could not be located or started.
    #[error("generation backend not found: {0}")]
    NotAvailable(String),

    #[error("generation backend I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Trait for text-generation backends.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Run the backend on `prompt`.
    ///
    /// Implementations must not leave work behind when the returned future
    /// is dropped; the adapter drops it to enforce its timeout.
    async fn generate(&self, prompt: &str) -> Result<BackendOutput, BackendError>;
}
