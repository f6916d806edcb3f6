use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::task::{JoinError, JoinSet};

use crate::cleanup;
use crate::compress::{Compressor, OutputLocks};
use crate::config::RunConfig;
use crate::error::WatchError;
use crate::message_log::MessageLog;
use crate::messages;
use crate::prompt::LinePrompt;
use crate::resolve::{ResolvedPaths, normalize_output_name, resolve};
use crate::watcher::{ChangeEvent, ChangeKind, EventStream};

/// Decides whether an event is a fresh PDF worth compressing: a rename-class
/// event for an existing `.pdf` that is not the output file itself.
pub fn accepts(event: &ChangeEvent, resolved: &ResolvedPaths) -> bool {
    event.kind == ChangeKind::Rename
        && resolved.is_valid_pdf_file
        && !resolved.input_is_same_as_output
}

/// Before the output name is known. Consumed into an [`Orchestrator`] once an
/// answer is accepted, even an empty one.
pub struct Startup<C> {
    directory: PathBuf,
    log: MessageLog,
    compressor: C,
    serialize_outputs: bool,
}

impl<C: Compressor> Startup<C> {
    pub fn new(directory: PathBuf, log: MessageLog, compressor: C, serialize_outputs: bool) -> Self {
        Self {
            directory,
            log,
            compressor,
            serialize_outputs,
        }
    }

    /// Ask for the output name until an answer arrives. Read errors are shown
    /// as transient lines and retried after `retry_delay`.
    pub async fn prompt<R, W>(
        self,
        prompt: &mut LinePrompt<R, W>,
        retry_delay: Duration,
    ) -> Orchestrator<C>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            self.log.redraw();
            match prompt.ask(&messages::output_prompt()).await {
                Ok(answer) => return self.with_output_name(&answer),
                Err(err) => {
                    tracing::warn!(error = %err, "failed to read output name, retrying");
                    self.log.push_transient(messages::error(&err));
                    tokio::time::sleep(retry_delay).await;
                }
            }
        }
    }

    /// Accept a raw answer. Blank (or bare `.pdf`) selects in-place mode.
    pub fn with_output_name(self, raw: &str) -> Orchestrator<C> {
        let config = RunConfig {
            watched_directory: self.directory,
            fixed_output_base_name: normalize_output_name(raw),
        };
        Orchestrator::new(config, self.log, self.compressor, self.serialize_outputs)
    }
}

struct Shared<C> {
    log: MessageLog,
    compressor: C,
    locks: Option<OutputLocks>,
    completed: AtomicU64,
}

/// The watch loop: turns change events into compressions and status lines.
pub struct Orchestrator<C> {
    config: RunConfig,
    shared: Arc<Shared<C>>,
    tasks: JoinSet<()>,
}

impl<C: Compressor> Orchestrator<C> {
    /// With `serialize_outputs` off, runs targeting the same output may
    /// overlap and the last one to finish wins.
    pub fn new(config: RunConfig, log: MessageLog, compressor: C, serialize_outputs: bool) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                log,
                compressor,
                locks: serialize_outputs.then(OutputLocks::new),
                completed: AtomicU64::new(0),
            }),
            tasks: JoinSet::new(),
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Successful compressions so far.
    pub fn completed(&self) -> u64 {
        self.shared.completed.load(Ordering::Relaxed)
    }

    /// Compressions started but not yet reaped.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Persistent header lines shown while watching.
    pub fn announce(&self) {
        let log = &self.shared.log;
        log.push(messages::watching(&self.config.watched_directory));
        if let Some(name) = &self.config.fixed_output_base_name {
            log.push(messages::fixed_output_warning(name));
        }
        log.push(messages::SEPARATOR);
    }

    /// Classify one event and, if accepted, start its compression without
    /// waiting for it. Returns whether the event was accepted.
    pub fn handle_event(&mut self, event: &ChangeEvent) -> bool {
        let resolved = resolve(
            &self.config.watched_directory,
            &event.filename,
            self.config.fixed_output_base_name.as_deref(),
        );

        if !accepts(event, &resolved) {
            tracing::trace!(filename = %event.filename, kind = ?event.kind, "ignored change");
            return false;
        }

        tracing::info!(
            input = %resolved.input_path.display(),
            output = %resolved.output_path.display(),
            "compressing"
        );
        self.shared
            .log
            .push_transient(messages::compressing(&event.filename));
        self.tasks.spawn(compress_and_settle(
            Arc::clone(&self.shared),
            event.filename.clone(),
            resolved,
        ));
        true
    }

    /// Compress one resolved pair and settle it, waiting for the result.
    #[cfg(test)]
    async fn compress_resolved(&self, filename: &str, resolved: ResolvedPaths) {
        compress_and_settle(Arc::clone(&self.shared), filename.to_string(), resolved).await;
    }

    /// Consume events until the stream ends, the watcher fails or `shutdown`
    /// resolves. Compressions still running are awaited before returning.
    pub async fn run<F>(&mut self, mut events: EventStream, shutdown: F) -> Result<(), WatchError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let result = loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break Ok(());
                }
                next = events.next() => match next {
                    Some(Ok(event)) => {
                        self.handle_event(&event);
                    }
                    Some(Err(err)) => {
                        tracing::error!(error = %err, "watcher failed");
                        break Err(err);
                    }
                    None => {
                        tracing::info!("event stream ended");
                        break Ok(());
                    }
                },
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => {
                    report_join(joined);
                }
            }
        };

        self.drain().await;
        result
    }

    /// Wait for every in-flight compression to settle.
    pub async fn drain(&mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            report_join(joined);
        }
    }
}

async fn compress_and_settle<C: Compressor>(
    shared: Arc<Shared<C>>,
    filename: String,
    resolved: ResolvedPaths,
) {
    let _output_guard = match &shared.locks {
        Some(locks) => Some(locks.lock(&resolved.output_path).await),
        None => None,
    };

    let result = shared
        .compressor
        .compress(&resolved.input_path, &resolved.output_path)
        .await;

    match result {
        Ok(outcome) if outcome.is_success() => {
            let completed = shared.completed.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::info!(input = %resolved.input_path.display(), completed, "compressed");
            shared.log.push_transient(messages::progress(completed));
            if !resolved.input_is_same_as_output {
                cleanup::remove_input(&resolved.input_path, &filename, &shared.log).await;
            }
        }
        Ok(outcome) => {
            let message = outcome.failure_message();
            tracing::warn!(
                input = %resolved.input_path.display(),
                exit_code = ?outcome.exit_code,
                %message,
                "compression failed"
            );
            shared.log.push_transient(messages::error(message));
        }
        Err(err) => {
            tracing::error!(input = %resolved.input_path.display(), error = %err, "compression not started");
            shared.log.push_transient(messages::error(err));
        }
    }
}

fn report_join(joined: Result<(), JoinError>) {
    if let Err(err) = joined {
        tracing::error!(error = %err, "compression task failed");
    }
}
