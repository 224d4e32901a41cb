//! parfind - find files by name, one search worker per name
//!
//! Entry point for the CLI application.

use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use parfind::CliArgs;
use tracing::{info, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            let _ = write_fatal(&mut io::stderr().lock(), &e);
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the run succeeded. Worker and channel failures have
/// already been printed as diagnostics by the time this returns.
fn run() -> Result<bool> {
    let args = CliArgs::parse();

    setup_logging(args.verbose)?;

    let report = args.into_search().run().context("search failed")?;

    info!(
        workers = report.workers(),
        matches = report.matches,
        entries = report.stats.entries,
        errors = report.stats.errors,
        elapsed_ms = report.stats.duration.as_millis() as u64,
        "search complete"
    );

    Ok(report.is_success())
}

/// The one line a fatal error gets on stderr.
fn write_fatal(out: &mut impl Write, e: &anyhow::Error) -> io::Result<()> {
    writeln!(out, "Error: {:#}", e)
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if verbose => EnvFilter::new("parfind=debug,warn"),
        Err(_) => EnvFilter::new("parfind=warn"),
    };

    // Results own stdout; logs go to stderr.
    let subscriber = log_subscriber(filter, io::stderr().is_terminal(), io::stderr);
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to initialise logging")?;

    Ok(())
}

fn log_subscriber<W>(filter: EnvFilter, ansi: bool, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish()
}
