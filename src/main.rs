use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sciter_typings::scope::PromptPicker;
use sciter_typings::sync::ScopeUpdate;
use sciter_typings::{
    select_scope, BundledSnapshot, Config, FileOutcome, FreshnessStore, HealthCheck, HttpFetcher,
    LocalFs, Scope, SqliteStore, SyncEngine, TrackedFile, TypingsError,
};

#[derive(Parser)]
#[command(name = "sciter-typings")]
#[command(about = "Keep Sciter declaration files in sync across workspace folders")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the typings into one workspace folder and create jsconfig.json
    Init {
        /// Workspace folder (picked from the configured workspaces if omitted)
        path: Option<PathBuf>,
    },

    /// Discard and re-download the typings of every workspace folder
    Update {
        /// Workspace folders (defaults to the configured workspaces)
        paths: Vec<PathBuf>,
    },

    /// Show stored ETags and on-disk presence per workspace folder
    Status {
        /// Workspace folders (defaults to the configured workspaces)
        paths: Vec<PathBuf>,
    },

    /// System health check and diagnostics
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = load_config(cli.config).await?;

    init_logging(cli.verbose, &config.logging.level)?;
    info!("Starting sciter-typings v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Init { path } => cmd_init(path, &config).await,
        Commands::Update { paths } => cmd_update(paths, &config).await,
        Commands::Status { paths } => cmd_status(paths, &config),
        Commands::Doctor => cmd_doctor(&config).await,
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool, level: &str) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

/// Load configuration from specified path or default location
async fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(&path),
        None => Config::load_or_default(),
    }
}

fn open_state(config: &Config) -> Result<SqliteStore> {
    match config.state_db_path() {
        Some(path) => SqliteStore::open_at(path),
        None => SqliteStore::open(),
    }
}

/// Wire the production components together
fn build_engine(config: &Config) -> Result<SyncEngine> {
    let fs = Arc::new(LocalFs);
    let tokens = FreshnessStore::new(Arc::new(open_state(config)?));
    let fetcher = HttpFetcher::new(&config.remote.base_url, config.request_timeout())?;
    let bundle_dir = BundledSnapshot::locate(config.bundle_dir().as_deref())?;
    info!("Using bundled typings from {}", bundle_dir.display());

    Ok(SyncEngine::new(
        Arc::new(fetcher),
        tokens,
        BundledSnapshot::new(bundle_dir, fs.clone()),
        fs,
    )
    .with_max_parallel(config.sync.max_parallel))
}

/// Scopes named on the command line, else the configured workspaces
fn resolve_scopes(paths: &[PathBuf], config: &Config) -> Result<Vec<Scope>> {
    if paths.is_empty() {
        config.scopes()
    } else {
        paths.iter().map(|p| Scope::new(p)).collect()
    }
}

/// Initialize typings for one workspace folder
async fn cmd_init(path: Option<PathBuf>, config: &Config) -> Result<()> {
    let scope = match path {
        Some(path) => Some(Scope::new(path)?),
        None => select_scope(&config.scopes()?, &PromptPicker)?,
    };

    let Some(scope) = scope else {
        warn!("{}", TypingsError::NoDestinationSelected);
        return Ok(());
    };

    info!("Initializing typings in {}", scope.root().display());
    let engine = build_engine(config)?;
    let report = engine.initialize(&scope).await?;

    println!("✅ Sciter typings initialized in {}", scope.root().display());
    println!("   📥 Downloaded: {}", report.updated_count());
    println!("   📦 From bundle: {}", report.recovered_count());
    if report.skipped_count() > 0 {
        println!("   ❌ Unavailable: {}", report.skipped_count());
        for file in &report.files {
            if let FileOutcome::Skipped {
                remote_error,
                fallback_error,
            } = &file.outcome
            {
                println!("      {}: {}", file.file, remote_error);
                println!("         fallback: {}", fallback_error);
            }
        }
    }
    println!("   ⏱️  Duration: {:.2}s", report.duration.as_secs_f64());

    Ok(())
}

/// Reset and resync every workspace folder
async fn cmd_update(paths: Vec<PathBuf>, config: &Config) -> Result<()> {
    let scopes = resolve_scopes(&paths, config)?;
    if scopes.is_empty() {
        warn!("{}", TypingsError::NoDestinationSelected);
        return Ok(());
    }

    let engine = build_engine(config)?;
    let summary = engine.update_all(&scopes).await;

    println!("\n🎉 Update Complete!");
    println!("   📊 Workspace folders: {}", summary.total_scopes);
    println!("   ✅ Refreshed: {}", summary.refreshed_scopes);
    println!("   ❌ Failed: {}", summary.failed_scopes);
    println!("   📄 Files written: {}", summary.files_written);
    println!("   ⏱️  Duration: {:.2}s", summary.duration.as_secs_f64());

    if summary.failed_scopes > 0 {
        println!("\n🔍 Failed Folders:");
        for result in &summary.results {
            if let ScopeUpdate::Failed { scope, error } = result {
                println!("   ❌ {}: {}", scope.root().display(), error);
            }
        }
    }

    Ok(())
}

/// Print stored ETags and on-disk presence per workspace folder
fn cmd_status(paths: Vec<PathBuf>, config: &Config) -> Result<()> {
    let scopes = resolve_scopes(&paths, config)?;
    if scopes.is_empty() {
        warn!("{}", TypingsError::NoDestinationSelected);
        return Ok(());
    }

    let tokens = FreshnessStore::new(Arc::new(open_state(config)?));

    for scope in &scopes {
        let stored = tokens
            .tokens_for(scope)
            .with_context(|| format!("Failed to read stored ETags for {}", scope.name()))?;
        let modules_dir = scope.modules_dir();

        println!("📁 {} ({})", scope.name(), scope.root().display());
        for file in TrackedFile::ALL {
            let present = modules_dir.join(file.file_name()).is_file();
            let etag = stored
                .iter()
                .find(|(f, _)| *f == file)
                .map(|(_, v)| v.value.as_str())
                .unwrap_or("—");
            println!(
                "   {} {:<24} {}",
                if present { "✅" } else { "❌" },
                file.file_name(),
                etag
            );
        }
        println!();
    }

    Ok(())
}

/// System health check and diagnostics
async fn cmd_doctor(config: &Config) -> Result<()> {
    let health = HealthCheck::run(config).await;
    print_health_report(&health);
    Ok(())
}

/// Print health check report to stdout
fn print_health_report(health: &HealthCheck) {
    use sciter_typings::health::CheckResult;

    fn print_check(name: &str, result: &CheckResult) {
        println!("{}:", name);
        let icon = if result.passed {
            if result.is_warning { "⚠️ " } else { "✅" }
        } else {
            "❌"
        };
        println!("  {} {}", icon, result.message);
        if let Some(details) = &result.details {
            for line in details.lines() {
                println!("     {}", line);
            }
        }
    }

    println!("🔍 sciter-typings System Diagnostics");
    println!();

    for (name, result) in health.all_checks() {
        print_check(name, result);
        println!();
    }

    let errors = health.errors();
    let warnings = health.warnings();
    if health.all_passed() {
        println!("✅ All checks passed ({} warning(s))", warnings.len());
    } else {
        println!(
            "❌ Some checks failed ({} error(s), {} warning(s))",
            errors.len(),
            warnings.len()
        );
    }
}
