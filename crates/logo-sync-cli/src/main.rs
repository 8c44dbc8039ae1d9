//! logo-sync CLI - PUNTO to Logo J-Platform sync service.

use clap::{Parser, Subcommand};
use logo_sync::{Config, CycleResult, HealthCheckResult, SyncError, SyncWorker};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[derive(Parser)]
#[command(name = "logo-sync")]
#[command(about = "Sync PUNTO receipts, orders, POS collections and dispatches into Logo J-Platform")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    /// Seconds to wait for the in-flight record after a shutdown signal
    #[arg(long, default_value = "60")]
    shutdown_timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sync loop until SIGINT/SIGTERM
    Run,

    /// Run a single sync cycle and exit
    Once {
        /// Skip the staging database: nothing is queued or logged
        #[arg(long)]
        no_staging: bool,
    },

    /// Test database connections and the J-Platform login
    HealthCheck,

    /// Create the staging queue and log tables
    InitSchema,

    /// Check the configuration file without connecting anywhere
    Validate,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), SyncError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(SyncError::Config)?;

    let config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Validate => {
            println!("Configuration is valid");
            println!("  Config hash: {}", config.hash());
        }

        Commands::InitSchema => {
            let worker = SyncWorker::connect(config).await?;
            worker.init_schema().await?;
            println!("Staging schema is ready");
        }

        Commands::HealthCheck => {
            let worker = SyncWorker::connect(config).await?;
            let result = worker.health_check().await;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                print_health(&result);
            }

            if !result.healthy {
                return Err(SyncError::Config("Health check failed".to_string()));
            }
        }

        Commands::Once { no_staging } => {
            let cancel_token = setup_signal_handler(cli.shutdown_timeout)?;
            let worker = if no_staging {
                SyncWorker::connect_without_staging(config).await?
            } else {
                SyncWorker::connect(config).await?
            };

            let result = worker.run_cycle(&cancel_token).await;

            if cli.output_json {
                println!("{}", result.to_json()?);
            } else {
                print_cycle(&result);
            }

            if result.cancelled {
                return Err(SyncError::Cancelled);
            }
        }

        Commands::Run => {
            let cancel_token = setup_signal_handler(cli.shutdown_timeout)?;
            let worker = SyncWorker::connect(config).await?;

            let service = worker.run(cancel_token.clone());
            tokio::pin!(service);

            tokio::select! {
                result = &mut service => result?,
                _ = cancel_token.cancelled() => {
                    let grace = Duration::from_secs(cli.shutdown_timeout);
                    match tokio::time::timeout(grace, &mut service).await {
                        Ok(result) => result?,
                        Err(_) => warn!(
                            "Shutdown timeout ({}s) reached with work still in flight",
                            cli.shutdown_timeout
                        ),
                    }
                }
            }

            return Err(SyncError::Cancelled);
        }
    }

    Ok(())
}

fn print_cycle(result: &CycleResult) {
    println!("\nSync cycle completed!");
    println!("  Cycle ID: {}", result.cycle_id);
    println!("  Duration: {:.2}s", result.duration_seconds);
    for pipeline in &result.pipelines {
        match &pipeline.error {
            Some(err) => println!("  {:<16} ERROR: {}", pipeline.name, err),
            None => println!(
                "  {:<16} {} sent, {} failed",
                pipeline.name, pipeline.stats.succeeded, pipeline.stats.failed
            ),
        }
    }
    println!(
        "  Total: {} sent, {} failed",
        result.total_succeeded(),
        result.total_failed()
    );
    if result.cancelled {
        println!("  Cancelled before all pipelines ran");
    }
}

fn print_health(result: &HealthCheckResult) {
    println!("Health Check Results:");
    let components = [
        ("PUNTO (MSSQL)", &result.source),
        ("Staging (MSSQL)", &result.staging),
        ("J-Platform login", &result.jplatform),
    ];
    for (name, health) in components {
        println!(
            "  {}: {} ({}ms)",
            name,
            if health.ok { "OK" } else { "FAILED" },
            health.latency_ms
        );
        if let Some(ref err) = health.error {
            println!("    Error: {}", err);
        }
    }
    println!("  Config hash: {}", result.config_hash);
    println!(
        "\n  Overall: {}",
        if result.healthy { "HEALTHY" } else { "UNHEALTHY" }
    );
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("unknown verbosity '{}'", other)),
    };

    // RUST_LOG wins over --verbosity when set.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}'", other)),
    }

    Ok(())
}

/// Cancel the returned token on SIGINT or SIGTERM.
#[cfg(unix)]
fn setup_signal_handler(shutdown_timeout: u64) -> Result<CancellationToken, SyncError> {
    let cancel_token = CancellationToken::new();
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let token = cancel_token.clone();
    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        };
        eprintln!(
            "\nReceived {}. Shutting down gracefully (timeout: {}s)...",
            name, shutdown_timeout
        );
        token.cancel();
    });

    Ok(cancel_token)
}

/// Ctrl-C only outside unix.
#[cfg(not(unix))]
fn setup_signal_handler(shutdown_timeout: u64) -> Result<CancellationToken, SyncError> {
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!(
                "\nReceived Ctrl-C. Shutting down gracefully (timeout: {}s)...",
                shutdown_timeout
            );
            token.cancel();
        }
    });

    Ok(cancel_token)
}
