//! JSON shapes written to stdout and stderr.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tax_core::{BracketTax, CalculationResult, Deduction, DeductionKind};

/// Response for a single calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    pub tax_refund: Decimal,

    pub tax_level: Vec<TaxLevel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxLevel {
    pub level: String,

    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
}

impl From<BracketTax> for TaxLevel {
    fn from(bracket: BracketTax) -> Self {
        Self {
            level: bracket.label,
            tax: bracket.tax,
        }
    }
}

impl From<CalculationResult> for TaxResponse {
    fn from(result: CalculationResult) -> Self {
        Self {
            tax: result.tax_due,
            tax_refund: result.refund,
            tax_level: result
                .bracket_breakdown
                .into_iter()
                .map(TaxLevel::from)
                .collect(),
        }
    }
}

/// Deduction amounts keyed the way admin responses name them.
/// Kinds not present in the source list are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionsResponse {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub personal_deduction: Option<Decimal>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub donation: Option<Decimal>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub k_receipt: Option<Decimal>,
}

impl<'a> FromIterator<&'a Deduction> for DeductionsResponse {
    fn from_iter<I: IntoIterator<Item = &'a Deduction>>(iter: I) -> Self {
        let mut response = Self::default();
        for deduction in iter {
            let slot = match deduction.kind {
                DeductionKind::Personal => &mut response.personal_deduction,
                DeductionKind::Donation => &mut response.donation,
                DeductionKind::KReceipt => &mut response.k_receipt,
            };
            *slot = Some(deduction.amount);
        }
        response
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
