//! Hostsgen - Entry point.
//!
//! Runs the pipeline once and exits. A non-zero exit status means no output
//! was written, either because there was no usable input or because the run
//! was interrupted.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hostsgen::cli::Cli;
use hostsgen::config::Config;
use hostsgen::context::{RunContext, RunLog};
use hostsgen::{Error, Pipeline};

/// Resolve once either Ctrl-C or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Ctrl-C received, aborting run..."),
        () = terminate => info!("SIGTERM received, aborting run..."),
    }
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("hostsgen={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    cli.apply_overrides(&mut config);

    let log = match &config.log_file {
        Some(path) => RunLog::open(path)
            .with_context(|| format!("Failed to open run log {}", path.display()))?,
        None => RunLog::tracing_only(),
    };
    let ctx = RunContext::new(log).context("Failed to create scratch area")?;

    info!(
        sources = ?config.sources,
        output = ?config.output,
        policy = ?config.whitelist_policy,
        archive = config.archive.enabled,
        "Starting run"
    );

    let pipeline = Pipeline::new(config)?;

    // Dropping the pipeline future on interruption leaves the previous output
    // untouched; the scratch area goes away with `ctx`.
    let summary = tokio::select! {
        result = pipeline.run(&ctx) => result?,
        () = shutdown_signal() => {
            ctx.log.error("run interrupted, output left untouched");
            return Err(Error::Interrupted.into());
        }
    };

    if !cli.quiet {
        println!(
            "{} domains written to {} ({}/{} sources, {} degraded, {} removed by whitelist)",
            summary.emitted,
            pipeline.config().output.display(),
            summary.sources_ok(),
            summary.sources.len(),
            summary.sources_degraded(),
            summary.removed_by_whitelist,
        );
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);
    run(cli).await
}
