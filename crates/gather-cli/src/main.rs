//! Demonstration binary for the cross-source dependency gather subsystem.
//!
//! This is not a package-manager CLI: it exists purely to exercise
//! `gather-driver::gather` end to end against either an HTTP registry or an
//! offline JSON fixture, and print what it found. Installing packages,
//! writing lock files, and resolving a winning version are all out of
//! scope — see spec.md §1.

mod fixture;
mod output;

use clap::{Parser, ValueEnum};
use gather_core::{GatherError, Identity, Profile, SourceRef, Version};
use gather_driver::{gather, GatherContext, NamedSource};
use gather_source::HttpSource;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, Level};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Gather the transitive dependency metadata closure of a package across
/// one or more sources.
#[derive(Parser, Debug)]
#[command(name = "gather")]
#[command(author = "Libretto Contributors")]
#[command(version)]
#[command(about = "Gather cross-source dependency metadata for a package", long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Root package in `id@version` form, e.g. `some.package@1.2.3.0`.
    pub root: String,

    /// Target compatibility profile to narrow dependency groups to.
    #[arg(long, default_value = "net8.0")]
    pub profile: String,

    /// Base URL of an HTTP-backed source (repeatable).
    #[arg(long = "source", value_name = "URL")]
    pub sources: Vec<Url>,

    /// Path to a JSON fixture file describing one or more in-memory
    /// sources (repeatable). See `fixture` module docs for the format.
    #[arg(long = "fixture", value_name = "PATH")]
    pub fixtures: Vec<PathBuf>,

    /// Include prerelease versions.
    #[arg(long)]
    pub include_prerelease: bool,

    /// Maximum number of concurrent `(source, id)` queries in flight.
    #[arg(long, default_value_t = 8)]
    pub max_parallelism: usize,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Increase logging verbosity (repeatable).
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all but error-level logging.
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 if cli.quiet => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to create runtime");

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> ExitCode {
    let root = match parse_identity(&cli.root) {
        Ok(identity) => identity,
        Err(e) => {
            error!("invalid root identity {:?}: {e}", cli.root);
            return ExitCode::FAILURE;
        }
    };
    let profile = Profile::new(cli.profile.clone());

    let mut sources = Vec::new();
    for url in &cli.sources {
        match HttpSource::new(url.as_str(), url.clone()) {
            Ok(source) => sources.push(NamedSource::new(
                SourceRef::new(url.as_str()),
                Arc::new(source),
            )),
            Err(e) => {
                error!("failed to build HTTP source for {url}: {e}");
                return ExitCode::FAILURE;
            }
        }
    }
    for path in &cli.fixtures {
        match fixture::load(path) {
            Ok(loaded) => sources.extend(loaded),
            Err(e) => {
                error!("failed to load fixture {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    let context = GatherContext {
        max_parallelism: cli.max_parallelism,
        include_prerelease: cli.include_prerelease,
    };
    let cancel = CancellationToken::new();
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_for_signal.cancel();
        }
    });

    match gather(&[root], &profile, &sources, &context, &cancel).await {
        Ok(records) => {
            output::print(&records, cli.format);
            ExitCode::SUCCESS
        }
        Err(GatherError::NoSourcesAvailable) => {
            error!("no configured source implements the query capability");
            ExitCode::FAILURE
        }
        Err(GatherError::Cancelled) => {
            error!("gather cancelled");
            ExitCode::FAILURE
        }
    }
}

fn parse_identity(raw: &str) -> anyhow::Result<Identity> {
    let (id, version) = raw
        .split_once('@')
        .ok_or_else(|| anyhow::anyhow!("expected `id@version`"))?;
    let version = Version::parse(version)?;
    Ok(Identity::new(id, version))
}
