use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use tax_core::{AllowanceRequest, CalculationRequest, DeductionKind};
use tracing::error;

use tax_cli::app;
use tax_cli::config::{AppConfig, ConfigOverrides, DATABASE_URL_ENV};
use tax_cli::logging;
use tax_cli::wire::ErrorResponse;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Progressive income tax calculator.
///
/// Results are printed to stdout as JSON. Failures print `{"error": ...}` to
/// stderr and exit non-zero.
#[derive(Debug, Parser)]
#[command(name = "tax-cli", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database backend to use.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `deductions.db`) or `:memory:`.
    #[arg(long, global = true)]
    db: Option<String>,

    /// Log level or `EnvFilter` directive. `RUST_LOG` takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Calculate tax for one taxpayer.
    Calculate {
        /// Total yearly income.
        #[arg(long, allow_negative_numbers = true, conflicts_with = "request")]
        total_income: Option<Decimal>,

        /// Tax already withheld at source.
        #[arg(
            long,
            default_value = "0",
            allow_negative_numbers = true,
            conflicts_with = "request"
        )]
        wht: Decimal,

        /// Claimed allowance as KIND=AMOUNT (donation, k-receipt). Repeatable.
        #[arg(
            long = "allowance",
            value_name = "KIND=AMOUNT",
            value_parser = app::parse_allowance,
            conflicts_with = "request"
        )]
        allowances: Vec<AllowanceRequest>,

        /// JSON request file, or `-` for stdin.
        #[arg(long)]
        request: Option<PathBuf>,
    },

    /// Calculate tax for every row of a CSV file (`totalIncome,wht,donation`).
    Batch {
        /// CSV file, or `-` for stdin.
        file: PathBuf,
    },

    /// Show or change the configured deduction amounts.
    Deductions {
        #[command(subcommand)]
        action: DeductionCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DeductionCommands {
    /// Print every configured deduction.
    List,

    /// Set one deduction (personal, donation, k-receipt).
    Set {
        #[arg(value_parser = app::parse_deduction_kind)]
        kind: DeductionKind,

        #[arg(allow_negative_numbers = true)]
        amount: Decimal,
    },

    /// Restore every deduction to its default amount.
    Reset,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            backend: self.backend.clone(),
            db: self.db.clone(),
            log_level: self.log_level.clone(),
            log_file: self.log_file.clone(),
        }
    }
}

// ─── input ───────────────────────────────────────────────────────────────────

fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("cannot open '{}'", path.display()))?;
    Ok(Box::new(file))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

// ─── entry point ─────────────────────────────────────────────────────────────

async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_env(std::env::var(DATABASE_URL_ENV).ok());
    config.apply_overrides(cli.overrides());

    logging::init_logging(&config.logging)?;

    let db_config = config.db_config();
    let repo = app::build_registry()
        .create(&db_config)
        .await
        .context("cannot open deduction store")?;
    let repo = repo.as_ref();

    match cli.command {
        Commands::Calculate {
            total_income,
            wht,
            allowances,
            request,
        } => {
            let request = match request {
                Some(path) => app::read_request(open_input(&path)?)?,
                None => CalculationRequest {
                    total_income,
                    wht,
                    allowances,
                },
            };
            print_json(&app::calculate(repo, &request).await?)
        }
        Commands::Batch { file } => print_json(&app::run_batch(repo, open_input(&file)?).await?),
        Commands::Deductions { action } => match action {
            DeductionCommands::List => print_json(&app::list_deductions(repo).await?),
            DeductionCommands::Set { kind, amount } => {
                print_json(&app::set_deduction(repo, kind, amount).await?)
            }
            DeductionCommands::Reset => print_json(&app::reset_deductions(repo).await?),
        },
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "command failed");
            let response = ErrorResponse::new(format!("{err:#}"));
            match serde_json::to_string(&response) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
