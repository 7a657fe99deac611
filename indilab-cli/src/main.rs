//! Indilab CLI: schema setup, CSV import and indicator runs.
//!
//! Commands:
//! - `init` - create or migrate the store schema
//! - `import` - load daily bars from CSV files
//! - `run` - compute indicators for every instrument and write them back

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use indilab_core::IndicatorEngine;
use indilab_runner::{import_csv, Dispatcher, PipelineConfig, SqlitePool, StorePool};

#[derive(Parser)]
#[command(name = "indilab", about = "Indilab CLI - daily-bar indicator engine")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database path. Overrides `store.path`.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// More log output (-v debug, -vv trace). Overrides RUST_LOG.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the instrument and daily tables, adding missing indicator columns.
    Init,
    /// Import daily bars from CSV files (header: date,open,high,low,close,volume).
    Import {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Instrument code. Defaults to the upper-cased file stem; only valid with one file.
        #[arg(long)]
        code: Option<String>,

        /// Instrument display name. Defaults to the code.
        #[arg(long)]
        name: Option<String>,
    },
    /// Compute indicators for the working set and write them back.
    Run {
        /// Worker threads. Overrides `dispatch.workers`.
        #[arg(long)]
        workers: Option<usize>,

        /// Only these instrument codes (comma separated). Overrides `dispatch.codes`.
        #[arg(long, value_delimiter = ',')]
        codes: Vec<String>,

        /// Print the run summary as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(db) = cli.db {
        config.store.path = db;
    }

    match cli.command {
        Commands::Init => run_init(&config),
        Commands::Import { files, code, name } => run_import(&config, &files, code, name),
        Commands::Run {
            workers,
            codes,
            json,
        } => {
            if let Some(w) = workers {
                config.dispatch.workers = w;
            }
            if !codes.is_empty() {
                config.dispatch.codes = codes;
            }
            config.validate()?;
            run_dispatch(&config, json)
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_pool(config: &PipelineConfig) -> Result<SqlitePool> {
    let pool = SqlitePool::open(&config.store, config.pool_size())
        .with_context(|| format!("open store {}", config.store.path.display()))?;
    pool.acquire()?.ensure_schema()?;
    tracing::debug!(
        path = %config.store.path.display(),
        pool_size = config.pool_size(),
        "store ready"
    );
    Ok(pool)
}

fn run_init(config: &PipelineConfig) -> Result<()> {
    open_pool(config)?;
    println!("Schema ready: {}", config.store.path.display());
    Ok(())
}

fn default_code(path: &Path) -> Result<String> {
    match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) if !stem.is_empty() => Ok(stem.to_ascii_uppercase()),
        _ => bail!("cannot derive an instrument code from {}", path.display()),
    }
}

fn run_import(
    config: &PipelineConfig,
    files: &[PathBuf],
    code: Option<String>,
    name: Option<String>,
) -> Result<()> {
    if code.is_some() && files.len() > 1 {
        bail!("--code can only be used with a single file");
    }
    let pool = open_pool(config)?;
    let mut store = pool.acquire()?;

    for file in files {
        let code = match &code {
            Some(c) => c.clone(),
            None => default_code(file)?,
        };
        let name = name.clone().unwrap_or_else(|| code.clone());
        let report = import_csv(&mut store, file, &code, &name)
            .with_context(|| format!("import {}", file.display()))?;
        println!(
            "{}: {} rows read, {} new",
            report.instrument, report.read, report.inserted
        );
    }
    Ok(())
}

/// No external KAMA implementation is bundled, so the chain starts at the
/// manual tier.
fn build_engine(config: &PipelineConfig) -> Result<IndicatorEngine> {
    Ok(IndicatorEngine::new(config.engine.clone(), None)?)
}

fn run_dispatch(config: &PipelineConfig, json: bool) -> Result<()> {
    let pool = open_pool(config)?;
    let engine = build_engine(config)?;
    let dispatcher = Dispatcher::from_config(&config.dispatch);

    let summary = dispatcher.run(&pool, &engine, None)?;
    if json {
        println!("{}", summary.to_json()?);
    } else {
        println!("{summary}");
    }

    if summary.failed > 0 {
        bail!("{} of {} instruments failed", summary.failed, summary.total());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "indilab", "--db", "x.db", "run", "--workers", "3", "--codes", "AAPL,MSFT", "--json",
        ])
        .unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("x.db")));
        match cli.command {
            Commands::Run {
                workers,
                codes,
                json,
            } => {
                assert_eq!(workers, Some(3));
                assert_eq!(codes, vec!["AAPL", "MSFT"]);
                assert!(json);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn engine_starts_at_manual_kama() {
        let engine = build_engine(&PipelineConfig::default()).unwrap();
        assert_eq!(
            engine.kama_tiers(),
            vec![indilab_core::KamaTier::Manual, indilab_core::KamaTier::Simplified]
        );
    }

    #[test]
    fn code_from_file_stem() {
        assert_eq!(default_code(Path::new("data/spy.csv")).unwrap(), "SPY");
        assert!(default_code(Path::new("/")).is_err());
    }
}
