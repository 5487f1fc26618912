//! dblog - command line front end for the dblog logger
//!
//! ```bash
//! dblog --config dblog.toml write warning "disk almost full"
//! dblog --config dblog.toml check
//! ```

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dblog::{LogLevel, Logger, LoggerConfig};
use dblog_connection::{
    ConnectionPool, HealthReport, HealthStatus, HealthThresholds, PoolConfig, check_pool,
};
use dblog_drivers::DriverRegistry;
use owo_colors::OwoColorize;

use crate::logging::LoggingConfig;

#[derive(Parser)]
#[command(name = "dblog")]
#[command(about = "Write log lines to the console, a file and a database", long_about = None)]
#[command(version)]
struct Cli {
    /// Logger configuration file
    #[arg(short, long, env = "DBLOG_CONFIG", value_name = "FILE", default_value = "dblog.toml")]
    config: PathBuf,

    /// Print debug diagnostics from the pool and drivers
    #[arg(short, long)]
    verbose: bool,

    /// Also write JSON diagnostics to the data directory
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write one line through every configured sink
    Write {
        /// Trace, debug, information, warning, error, fatal or success
        #[arg(value_name = "LEVEL")]
        level: LogLevel,

        /// Message text
        #[arg(value_name = "TEXT", required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Connect to the log database and report its health
    Check {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Latency up to which the database counts as healthy
        #[arg(long, value_name = "MS", default_value_t = 100)]
        healthy_ms: u64,

        /// Latency up to which the database counts as degraded
        #[arg(long, value_name = "MS", default_value_t = 500)]
        degraded_ms: u64,

        /// Give up on the ping after this long
        #[arg(long, value_name = "MS", default_value_t = 5000)]
        timeout_ms: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut logging_config = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    };
    logging_config.enable_json_logs = cli.json_logs;
    let _guard = match logging::init(&logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{} {:#}", "warning:".yellow(), e);
            None
        }
    };

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = LoggerConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let registry = DriverRegistry::with_defaults();

    match cli.command {
        Command::Write { level, text } => {
            write(&config, &registry, level, &text.join(" ")).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check {
            json,
            healthy_ms,
            degraded_ms,
            timeout_ms,
        } => {
            let thresholds = HealthThresholds::new(healthy_ms, degraded_ms)
                .with_ping_timeout(Duration::from_millis(timeout_ms));
            let report = check(&config, &registry, &thresholds).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(if report.status.is_usable() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

async fn write(
    config: &LoggerConfig,
    registry: &DriverRegistry,
    level: LogLevel,
    text: &str,
) -> Result<()> {
    let logger = Logger::from_config(config, registry)
        .await
        .context("setting up logger")?;
    let result = logger.write_line(level, text).await;
    logger.shutdown().await;
    result.context("writing log line")
}

async fn check(
    config: &LoggerConfig,
    registry: &DriverRegistry,
    thresholds: &HealthThresholds,
) -> Result<HealthReport> {
    let Some(database) = &config.database else {
        bail!("no [database] section in the configuration");
    };
    let connection = database.connection_config();
    let driver = registry.for_config(&connection)?;
    tracing::info!(url = %connection.redacted_url(), "checking log database");

    let pool = ConnectionPool::new(
        PoolConfig::from_database(&connection.database),
        connection,
        driver,
    )?;
    let report = check_pool(&pool, thresholds).await;
    pool.shutdown().await;
    Ok(report)
}

fn print_report(report: &HealthReport) {
    let status = report.status.to_string();
    let status = match report.status {
        HealthStatus::Healthy => status.green().to_string(),
        HealthStatus::Degraded => status.yellow().to_string(),
        HealthStatus::Unhealthy | HealthStatus::Unreachable => status.red().to_string(),
    };
    println!("{:<10} {}", "status".bold(), status);

    if let Some(latency) = report.latency {
        println!("{:<10} {:.2} ms", "latency".bold(), latency.as_secs_f64() * 1000.0);
    }
    if let Some(handle) = report.handle {
        println!("{:<10} {}", "handle".bold(), handle);
    }
    println!(
        "{:<10} {} open / {} slots",
        "pool".bold(),
        report.stats.open(),
        report.stats.total()
    );
    if let Some(error) = &report.error {
        println!("{:<10} {}", "error".bold(), error.red());
    }
}
