use anyhow::{Context, Result};
use clap::Parser;
use enrollmerge::{discover_sources, run, Config, MergeError};
use std::{fs, path::PathBuf, process::ExitCode};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "enrollmerge")]
#[command(about = "Merge per-class student rosters into one enrollment table")]
#[command(version = "0.1.0")]
struct Cli {
    /// Source tables: files, directories or glob patterns (.xlsx, .xls, .ods, .csv)
    sources: Vec<String>,

    /// Target table (.xlsx or .csv); created if it does not exist
    #[arg(long, short)]
    target: Option<PathBuf>,

    /// YAML file overriding header keywords, relation words and labels
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write the run report as JSON to this path
    #[arg(long)]
    report_json: Option<PathBuf>,
}

fn main() -> ExitCode {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<MergeError>() {
            Some(
                e @ (MergeError::NoSources | MergeError::NoTarget | MergeError::NothingToProcess),
            ) => {
                println!("{}", e);
                ExitCode::from(2)
            }
            _ => {
                error!("{:#}", err);
                eprintln!("error: {:#}", err);
                ExitCode::FAILURE
            }
        },
    }
}

fn execute(cli: &Cli) -> Result<()> {
    // ─── 2) configuration ────────────────────────────────────────────
    let cfg = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    // ─── 3) discover sources ─────────────────────────────────────────
    let sources = discover_sources(&cli.sources)?;
    if sources.is_empty() {
        return Err(MergeError::NoSources.into());
    }
    let target = cli.target.clone().ok_or(MergeError::NoTarget)?;

    // ─── 4) merge + write ────────────────────────────────────────────
    let report = run(&sources, &target, &cfg)?;
    if report.failed_files() > 0 {
        info!("{} source tables failed; see log above", report.failed_files());
    }
    print!("{}", report.render_summary());

    // ─── 5) optional JSON report ─────────────────────────────────────
    if let Some(path) = &cli.report_json {
        let json = serde_json::to_string_pretty(&report).context("serializing run report")?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        info!("report written to {}", path.display());
    }
    Ok(())
}
