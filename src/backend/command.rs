//! External-command backend.
//!
//! Runs `<program> run <model> <prompt>` (the Ollama CLI shape) and
//! captures its output.

use std::io::ErrorKind;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::{BackendError, BackendOutput, GenerationBackend};
use crate::config::BackendConfig;

/// Backend that shells out to a local generation CLI.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: String,
    model: String,
}

impl CommandBackend {
    pub fn new(program: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(&config.program, &config.model)
    }
}

#[async_trait]
impl GenerationBackend for CommandBackend {
    #[instrument(skip(self, prompt), fields(program = %self.program, model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<BackendOutput, BackendError> {
        debug!(prompt_len = prompt.len(), "Invoking generation backend");

        // Spawn the generation CLI; the prompt travels as the last argument
        let mut child = Command::new(&self.program)
            .arg("run")
            .arg(&self.model)
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            // A missing or non-executable program means no backend at all
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    BackendError::NotAvailable(format!("{}: {e}", self.program))
                }
                _ => BackendError::Io(e),
            })?;

        // Take pipe handles out so `child` stays owned for `wait`
        let mut child_stdout = child
            .stdout
            .take()
            .ok_or_else(|| BackendError::Other("Failed to open stdout".into()))?;
        let mut child_stderr = child
            .stderr
            .take()
            .ok_or_else(|| BackendError::Other("Failed to open stderr".into()))?;

        // Read stdout+stderr concurrently so neither pipe fills up and blocks
        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();
        let (r1, r2) = tokio::join!(
            child_stdout.read_to_end(&mut stdout_buf),
            child_stderr.read_to_end(&mut stderr_buf),
        );
        r1?;
        r2?;

        let status = child.wait().await?;

        let output = BackendOutput {
            // Signal-terminated children have no exit code
            exit_code: status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&stdout_buf).into_owned(),
            stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
        };

        debug!(exit_code = output.exit_code, "Generation backend finished");

        Ok(output)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn write_script(dir: &Path, body: &str) -> String {
        let path = dir.join("fake-ollama");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn passes_model_and_prompt_as_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let program = write_script(dir.path(), r#"echo "$1|$2|$3""#);

        let backend = CommandBackend::new(program, "tiny-model");
        let output = backend.generate("hello there").await.unwrap();

        assert_eq!(output.exit_code, 0);
        assert_eq!(output.stdout, "run|tiny-model|hello there\n");
        assert!(output.stderr.is_empty());
    }

    #[tokio::test]
    async fn captures_failure_exit_and_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let program = write_script(dir.path(), "echo 'model not loaded' >&2\nexit 3");

        let backend = CommandBackend::new(program, "tiny-model");
        let output = backend.generate("hi").await.unwrap();

        assert_eq!(output.exit_code, 3);
        assert!(output.stdout.is_empty());
        assert_eq!(output.stderr, "model not loaded\n");
    }

    #[tokio::test]
    async fn missing_program_is_not_available() {
        let backend = CommandBackend::new("/nonexistent/generation-cli", "m");
        let err = backend.generate("hi").await.unwrap_err();
        assert!(matches!(err, BackendError::NotAvailable(_)));
    }
}
