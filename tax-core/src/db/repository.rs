use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::calculations::DeductionConfig;
use crate::models::{Deduction, DeductionKind};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Config store holding the administrator-adjustable deduction amounts.
#[async_trait]
pub trait DeductionRepository: Send + Sync {
    /// Every stored deduction, ordered by kind.
    async fn list_deductions(&self) -> Result<Vec<Deduction>, RepositoryError>;

    async fn get_deduction(
        &self,
        kind: DeductionKind,
    ) -> Result<Deduction, RepositoryError>;

    /// Overwrites the amount for `kind` and returns the stored record.
    ///
    /// Range checks belong to the caller; see
    /// [`validate_deduction_update`](crate::validation::validate_deduction_update).
    async fn update_deduction(
        &self,
        kind: DeductionKind,
        amount: Decimal,
    ) -> Result<Deduction, RepositoryError>;

    /// Restores every deduction to [`DeductionKind::default_amount`].
    async fn reset_deductions(&self) -> Result<Vec<Deduction>, RepositoryError>;

    /// Fresh read-only snapshot for one calculation or one batch.
    async fn deduction_config(&self) -> Result<DeductionConfig, RepositoryError> {
        Ok(self.list_deductions().await?.into_iter().collect())
    }
}
