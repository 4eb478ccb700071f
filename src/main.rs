use std::fs::{self, File, OpenOptions};
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use typo3_update_check::cache::{CacheStore, SqliteCache};
use typo3_update_check::config::{self, Config};
use typo3_update_check::report::format::{CONFIRMATION_PROMPT, format_report};
use typo3_update_check::report::{Decision, UpdateImpactChecker};

#[derive(Parser)]
#[command(name = "typo3-update-check")]
#[command(
    version,
    about = "Report breaking changes and security fixes between two TYPO3 core versions"
)]
struct Cli {
    /// Currently installed version
    from: String,

    /// Version to update to
    to: String,

    /// Path to a JSON config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory holding the cache database
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Do not read or write the cache
    #[arg(long)]
    no_cache: bool,

    /// Remove every cached entry before checking
    #[arg(long)]
    clear_cache: bool,

    /// Ask for confirmation when important changes are found
    #[arg(long)]
    confirm: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.verbose);

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let cache = open_cache(cli, &config);
    let checker = UpdateImpactChecker::from_config(&config, cache);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let report = match runtime.block_on(checker.check(&cli.from, &cli.to)) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };

    print!("{}", format_report(&report));

    let interactive = cli.confirm && io::stdin().is_terminal();
    if report.decide(interactive, ask_confirmation) == Decision::Abort {
        println!("Update cancelled by user.");
    }

    Ok(ExitCode::SUCCESS)
}

/// Opens the cache database, or returns `None` to run without caching
fn open_cache(cli: &Cli, config: &Config) -> Option<Arc<dyn CacheStore>> {
    if cli.no_cache || !config.cache.enabled {
        debug!("Cache disabled");
        return None;
    }

    let dir = cli.cache_dir.clone().unwrap_or_else(config::cache_dir);
    if let Err(e) = fs::create_dir_all(&dir) {
        warn!("Running without cache, cannot create {}: {}", dir.display(), e);
        return None;
    }

    let cache = SqliteCache::new(&config::db_path(&dir), config.cache.index_ttl_secs)
        .inspect_err(|e| warn!("Running without cache: {}", e))
        .ok()?;

    if cli.clear_cache {
        match cache.clear() {
            Ok(count) => info!("Cleared {} cache entries", count),
            Err(e) => warn!("Failed to clear cache: {}", e),
        }
    } else {
        match cache.purge_expired() {
            Ok(0) => {}
            Ok(count) => debug!("Purged {} expired cache entries", count),
            Err(e) => warn!("Failed to purge expired cache entries: {}", e),
        }
    }

    Some(Arc::new(cache))
}

fn ask_confirmation() -> bool {
    print!("{}", CONFIRMATION_PROMPT);
    let _ = io::stdout().flush();

    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }

    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Logs to the data directory, and to stderr with `--verbose` or when the log file is unusable
fn init_tracing(verbose: bool) -> Option<WorkerGuard> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match open_log_file(&config::log_path()) {
        Some(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_layer = (verbose || file_layer.is_none()).then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    guard
}

fn open_log_file(path: &Path) -> Option<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).ok()?;
    }

    OpenOptions::new().create(true).append(true).open(path).ok()
}
