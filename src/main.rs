use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdf_watch::cli::Cli;
use pdf_watch::compress::Ghostscript;
use pdf_watch::config::Settings;
use pdf_watch::message_log::MessageLog;
use pdf_watch::pipeline::Startup;
use pdf_watch::prompt::LinePrompt;
use pdf_watch::surface::TerminalSurface;
use pdf_watch::watcher::start_watcher;

fn main() -> Result<()> {
    // Diagnostics go to stderr; stdout belongs to the status screen.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_cli(&cli)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(watch(settings))
}

async fn watch(settings: Settings) -> Result<()> {
    let log = MessageLog::new(Arc::new(TerminalSurface)).with_transient_ttl(settings.transient_ttl);
    let startup = Startup::new(
        settings.watched_directory.clone(),
        log,
        Ghostscript::new(settings.compressor.clone()),
        settings.serialize_outputs,
    );

    let mut orchestrator = match &settings.preset_output {
        Some(answer) => startup.with_output_name(answer),
        None => {
            let mut prompt = LinePrompt::stdio();
            startup.prompt(&mut prompt, settings.retry_delay).await
        }
    };

    let (mut handle, events) = start_watcher(&orchestrator.config().watched_directory)?;
    orchestrator.announce();

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };
    let result = orchestrator.run(events, shutdown).await;
    handle.stop();

    result?;
    Ok(())
}
