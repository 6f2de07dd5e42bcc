//! Boundary validation.
//!
//! These checks run before anything reaches the engine. Each function
//! collects every violation it finds instead of stopping at the first, and
//! the engine itself trusts its input.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Allowance, AllowanceKind, CalculationInput, CalculationRequest, DeductionKind};

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every violation found in one request.
#[derive(Debug, Clone, Default, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{}", join_violations(.0))]
pub struct ValidationErrors(pub Vec<FieldViolation>);

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    fn push(
        &mut self,
        field: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.0.push(FieldViolation::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.0
    }

    fn into_result<T>(
        self,
        value: T,
    ) -> Result<T, ValidationErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

/// Validates a raw request and converts it into engine input.
///
/// Rules:
/// - `totalIncome` is required and must not be negative
/// - `wht` must not be negative, and when positive must be below `totalIncome`
/// - every allowance amount must not be negative
/// - every `allowanceType` must be `donation` or `k-receipt`
pub fn validate_calculation_request(
    request: &CalculationRequest
) -> Result<CalculationInput, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let total_income = match request.total_income {
        None => {
            errors.push("totalIncome", "is required");
            Decimal::ZERO
        }
        Some(income) if income < Decimal::ZERO => {
            errors.push("totalIncome", "must be greater than or equal to 0");
            income
        }
        Some(income) => income,
    };

    if request.wht < Decimal::ZERO {
        errors.push("wht", "must be greater than or equal to 0");
    } else if request.wht > Decimal::ZERO
        && request.total_income.is_some()
        && request.wht >= total_income
    {
        errors.push("wht", "must be less than totalIncome");
    }

    let mut allowances = Vec::with_capacity(request.allowances.len());
    for (index, allowance) in request.allowances.iter().enumerate() {
        let kind = AllowanceKind::parse(&allowance.allowance_type);
        if kind.is_none() {
            errors.push(
                format!("allowances[{index}].allowanceType"),
                format!(
                    "'{}' is not one of: donation, k-receipt",
                    allowance.allowance_type
                ),
            );
        }
        if allowance.amount < Decimal::ZERO {
            errors.push(
                format!("allowances[{index}].amount"),
                "must be greater than or equal to 0",
            );
        }
        if let Some(kind) = kind {
            allowances.push(Allowance {
                kind,
                amount: allowance.amount,
            });
        }
    }

    errors.into_result(CalculationInput {
        total_income,
        withheld_tax: request.wht,
        allowances,
    })
}

/// Inclusive range an administrator may set for each deduction.
pub fn deduction_bounds(kind: DeductionKind) -> (Decimal, Decimal) {
    match kind {
        DeductionKind::Personal => (dec!(10000), dec!(100000)),
        DeductionKind::Donation => (dec!(0), dec!(100000)),
        DeductionKind::KReceipt => (dec!(0), dec!(100000)),
    }
}

/// Validates a new amount for a configurable deduction.
pub fn validate_deduction_update(
    kind: DeductionKind,
    amount: Decimal,
) -> Result<Decimal, ValidationErrors> {
    let (min, max) = deduction_bounds(kind);
    let mut errors = ValidationErrors::default();

    if amount < min || amount > max {
        errors.push("amount", format!("{kind} deduction must be between {min} and {max}"));
    }

    errors.into_result(amount)
}
