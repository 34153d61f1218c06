use std::ffi::OsString;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use keyaudit::audit::{render, render_json, AuditError};
use keyaudit::config::{Config, LogConfig, ReportFormat};

const USAGE: &str = "Usage: keyaudit <host> <port> <dbnum> <sample_size>";

/// Samples random keys from one database and reports per-shape statistics.
#[derive(Parser, Debug)]
#[command(name = "keyaudit", disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    host: String,
    port: u16,
    #[arg(allow_negative_numbers = true)]
    db: i64,
    sample_size: u64,
}

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_new(&log.level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ========================================
// MAIN ENTRY POINT
// ========================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(usage) => {
            println!("{}", usage);
            return ExitCode::from(1);
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Audit aborted: {}", e);
            eprintln!("{}", e);
            ExitCode::from(1)
        }
    }
}

fn parse_args<I, T>(args: I) -> Result<Cli, AuditError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|_| AuditError::Usage(USAGE.to_string()))
}

async fn run(cli: Cli) -> Result<(), AuditError> {
    let config = Config::load()?;
    init_tracing(&config.log);

    if config.report.format == ReportFormat::Text {
        println!(
            "Auditing {}:{} db:{} sampling {} keys",
            cli.host, cli.port, cli.db, cli.sample_size
        );
    }

    let result = keyaudit::run_audit(&cli.host, cli.port, cli.db, cli.sample_size, &config).await?;

    match config.report.format {
        ReportFormat::Text => print!("{}", render(&result)),
        ReportFormat::Json => println!("{}", render_json(&result)?),
    }
    Ok(())
}
