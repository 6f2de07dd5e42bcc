use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Allowance;

/// A validated calculation request, built per request or per batch row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationInput {
    pub total_income: Decimal,
    pub withheld_tax: Decimal,
    pub allowances: Vec<Allowance>,
}

/// Tax apportioned to one bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketTax {
    pub label: String,
    pub tax: Decimal,
}

/// Net position after the withholding credit. At most one side is nonzero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub tax_due: Decimal,
    pub refund: Decimal,
}

/// Result of a single calculation.
///
/// `bracket_breakdown` holds one entry per bracket and is computed on
/// pre-withholding taxable income, so it is populated for refunds as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub tax_due: Decimal,
    pub refund: Decimal,
    pub bracket_breakdown: Vec<BracketTax>,
}
