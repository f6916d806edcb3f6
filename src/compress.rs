use std::collections::HashMap;
use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::process::Command;
use tokio::sync::OwnedMutexGuard;

use crate::config::CompressorSettings;
use crate::error::CompressError;

/// Result of one compressor run, with both output streams captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressionOutcome {
    /// Exit code, if the process ran and exited normally.
    pub exit_code: Option<i32>,
    /// Launch failure or non-zero exit, as text.
    pub error: Option<String>,
    pub stdout: String,
    pub stderr: String,
}

impl CompressionOutcome {
    /// No process error and nothing on stderr. Ghostscript can exit 0 while
    /// still complaining on stderr; that counts as a failure.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.stderr.is_empty()
    }

    /// One line describing a failed run: the error (or stderr) followed by stdout.
    pub fn failure_message(&self) -> String {
        let cause = match &self.error {
            Some(error) => error.clone(),
            None => self.stderr.trim_end().to_string(),
        };
        format!("{cause} {}", self.stdout.trim_end())
            .trim()
            .to_string()
    }
}

/// Compresses one PDF into another path.
pub trait Compressor: Send + Sync + 'static {
    fn compress(
        &self,
        input: &Path,
        output: &Path,
    ) -> impl Future<Output = Result<CompressionOutcome, CompressError>> + Send;
}

/// Runs Ghostscript's `pdfwrite` device with a fixed argument template.
#[derive(Debug, Clone)]
pub struct Ghostscript {
    settings: CompressorSettings,
}

impl Ghostscript {
    pub fn new(settings: CompressorSettings) -> Self {
        Self { settings }
    }

    /// Arguments passed to the executable. Paths go through as single argv
    /// entries, never through a shell.
    pub fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        let mut output_arg = OsString::from("-sOutputFile=");
        output_arg.push(output.as_os_str());

        vec![
            OsString::from("-sDEVICE=pdfwrite"),
            OsString::from(format!(
                "-dCompatibilityLevel={}",
                self.settings.compatibility_level
            )),
            OsString::from(format!("-dPDFSETTINGS={}", self.settings.pdf_settings)),
            OsString::from("-dNOPAUSE"),
            OsString::from("-dQUIET"),
            OsString::from("-dBATCH"),
            output_arg,
            input.as_os_str().to_os_string(),
        ]
    }

    /// Shell-quoted rendering of the command, for diagnostics only.
    pub fn command_line(&self, input: &Path, output: &Path) -> String {
        let words: Vec<String> = std::iter::once(self.settings.program.as_os_str().to_os_string())
            .chain(self.args(input, output))
            .map(|word| word.to_string_lossy().into_owned())
            .collect();
        shlex::try_join(words.iter().map(String::as_str)).unwrap_or_else(|_| words.join(" "))
    }
}

impl Compressor for Ghostscript {
    fn compress(
        &self,
        input: &Path,
        output: &Path,
    ) -> impl Future<Output = Result<CompressionOutcome, CompressError>> + Send {
        async move {
            if output.as_os_str().is_empty() {
                return Err(CompressError::EmptyOutput);
            }
            if input.as_os_str().is_empty() {
                return Err(CompressError::EmptyInput);
            }

            let command_line = self.command_line(input, output);
            tracing::debug!(command = %command_line, "running compressor");

            let result = Command::new(&self.settings.program)
                .args(self.args(input, output))
                .stdin(Stdio::null())
                .output()
                .await;

            let outcome = match result {
                Ok(out) => CompressionOutcome {
                    exit_code: out.status.code(),
                    error: (!out.status.success())
                        .then(|| format!("Command failed ({}): {command_line}", out.status)),
                    stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
                },
                Err(err) => CompressionOutcome {
                    error: Some(format!(
                        "failed to launch {}: {err}",
                        self.settings.program.display()
                    )),
                    ..CompressionOutcome::default()
                },
            };
            Ok(outcome)
        }
    }
}

/// One async mutex per output path, so runs writing the same file take turns.
#[derive(Debug, Clone, Default)]
pub struct OutputLocks {
    slots: Arc<Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>>,
}

impl OutputLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `output`. The guard releases it on drop.
    pub async fn lock(&self, output: &Path) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            // Slots only referenced by the map are idle.
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            Arc::clone(slots.entry(output.to_path_buf()).or_default())
        };
        slot.lock_owned().await
    }

    /// Number of outputs currently held or awaited.
    pub fn active(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| Arc::strong_count(slot) > 1)
            .count()
    }
}
