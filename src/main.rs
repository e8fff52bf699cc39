use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use reqlens::api::{ApiClient, DEFAULT_SERVER};
use reqlens::ui::app::run_tui;

/// Interactive review workspace for requirements-vs-schema comparisons.
#[derive(Debug, Parser)]
#[command(name = "reqlens", version, about)]
struct Cli {
    /// Comparison/report server base URL.
    #[arg(long, env = "REQLENS_SERVER", default_value = DEFAULT_SERVER)]
    server: String,

    /// Requirements file to prefill in the compare form.
    #[arg(long)]
    requirements: Option<PathBuf>,

    /// Schema JSON URL to prefill in the compare form.
    #[arg(long)]
    schema_url: Option<String>,

    /// Override the data directory (logs, persisted UI state).
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Load .env early; ignore if missing.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(reqlens::default_data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    // Stdout belongs to the TUI, so logs go to a file. The guard must stay
    // alive for the process lifetime or buffered lines are lost.
    let _log_guard = init_tracing(&data_dir)?;

    let api = ApiClient::new(&cli.server)
        .with_context(|| format!("building API client for {}", cli.server))?;

    run_tui(api, data_dir, cli.requirements, cli.schema_url)
}

fn init_tracing(data_dir: &std::path::Path) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("REQLENS_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let file_appender = tracing_appender::rolling::never(data_dir, "reqlens.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(guard)
}
