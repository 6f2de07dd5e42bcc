use std::io::Read;
use std::str::FromStr;

use rust_decimal::Decimal;
use tax_core::db::{DeductionRepository, RepositoryError, RepositoryRegistry};
use tax_core::{
    AllowanceRequest, CalculationRequest, DeductionKind, MissingDeductions, TaxEngine,
    ValidationErrors, validate_calculation_request, validate_deduction_update,
};
use tax_data::{BatchError, BatchReport, BatchRunner};
use tax_db_sqlite::SqliteRepositoryFactory;
use thiserror::Error;
use tracing::{info, warn};

use crate::wire::{DeductionsResponse, TaxResponse};

/// Deductions the engine reads; a snapshot without them is refused.
pub const REQUIRED_DEDUCTIONS: [DeductionKind; 2] =
    [DeductionKind::Personal, DeductionKind::Donation];

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    MissingDeductions(#[from] MissingDeductions),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("invalid JSON request: {0}")]
    Json(#[from] serde_json::Error),
}

/// Registry with every storage backend this binary ships with.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Parses a JSON calculation request.
pub fn read_request<R: Read>(reader: R) -> Result<CalculationRequest, AppError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Validates `request`, snapshots the deductions, and runs the engine.
pub async fn calculate(
    repo: &dyn DeductionRepository,
    request: &CalculationRequest,
) -> Result<TaxResponse, AppError> {
    let input = validate_calculation_request(request).inspect_err(|violations| {
        warn!(%violations, "calculation request rejected");
    })?;

    let config = repo.deduction_config().await?;
    config.require(&REQUIRED_DEDUCTIONS)?;

    let result = TaxEngine::standard().calculate(&config, &input);
    info!(
        total_income = %input.total_income,
        tax_due = %result.tax_due,
        refund = %result.refund,
        "calculation complete"
    );

    Ok(TaxResponse::from(result))
}

/// Evaluates a CSV batch against one deduction snapshot.
pub async fn run_batch<R: Read>(
    repo: &dyn DeductionRepository,
    reader: R,
) -> Result<BatchReport, AppError> {
    let config = repo.deduction_config().await?;
    config.require(&REQUIRED_DEDUCTIONS)?;

    BatchRunner::standard()
        .run(&config, reader)
        .inspect_err(|error| {
            warn!(%error, "batch rejected");
        })
        .map_err(AppError::from)
}

pub async fn list_deductions(
    repo: &dyn DeductionRepository
) -> Result<DeductionsResponse, AppError> {
    let deductions = repo.list_deductions().await?;
    Ok(deductions.iter().collect())
}

/// Range-checks and stores a new amount, echoing only the changed kind.
pub async fn set_deduction(
    repo: &dyn DeductionRepository,
    kind: DeductionKind,
    amount: Decimal,
) -> Result<DeductionsResponse, AppError> {
    let amount = validate_deduction_update(kind, amount).inspect_err(|violations| {
        warn!(%kind, %violations, "deduction update rejected");
    })?;

    let stored = repo.update_deduction(kind, amount).await?;
    Ok(std::iter::once(&stored).collect())
}

pub async fn reset_deductions(
    repo: &dyn DeductionRepository
) -> Result<DeductionsResponse, AppError> {
    let deductions = repo.reset_deductions().await?;
    Ok(deductions.iter().collect())
}

/// Parses `KIND=AMOUNT` from the command line into an unvalidated allowance.
pub fn parse_allowance(s: &str) -> Result<AllowanceRequest, String> {
    let (kind, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KIND=AMOUNT, got '{s}'"))?;
    let amount = Decimal::from_str(amount.trim())
        .map_err(|e| format!("invalid amount '{}': {e}", amount.trim()))?;

    Ok(AllowanceRequest {
        allowance_type: kind.trim().to_string(),
        amount,
    })
}

pub fn parse_deduction_kind(s: &str) -> Result<DeductionKind, String> {
    DeductionKind::parse(s).ok_or_else(|| {
        let names: Vec<_> = DeductionKind::ALL.iter().map(DeductionKind::as_str).collect();
        format!("unknown deduction '{s}'; expected one of: {}", names.join(", "))
    })
}
