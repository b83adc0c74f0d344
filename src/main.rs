use anyhow::{Context, Result};
use catalogue_audit::{audit_folder, AuditConfig, ReportFormat, VERSION};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};

/// Audit a full catalogue export (full<N>.lex files) and write a findings report
#[derive(Parser, Debug)]
#[command(name = "catalogue-audit", version = VERSION)]
struct Cli {
    /// Folder containing full<N>.lex files
    #[arg(short = 'i', long = "input-folder", default_value = ".")]
    input_folder: PathBuf,

    /// Folder to write the report into (created if missing)
    #[arg(short = 'o', long = "output-folder", default_value = ".")]
    output_folder: PathBuf,

    /// Verbose diagnostic logging; results are unchanged
    #[arg(long)]
    debug: bool,

    /// JSON file overriding the default audit configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report format (overrides the configuration file)
    #[arg(long, value_enum)]
    format: Option<ReportFormat>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => AuditConfig::from_file(path)?,
        None => AuditConfig::default(),
    };
    if let Some(format) = cli.format {
        config = config.with_format(format);
    }
    debug!(?config, "configuration loaded");

    let report = audit_folder(&cli.input_folder, &cli.output_folder, &config)
        .with_context(|| format!("audit of {} failed", cli.input_folder.display()))?;

    info!(report = %report.display(), "done");
    println!("Report written to {}", report.display());
    Ok(())
}

/// Initialize tracing/logging based on CLI flags
fn init_logging(debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    debug!("Logging initialized at level: {}", level);
}
