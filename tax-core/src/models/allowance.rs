use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Allowance categories a taxpayer may claim.
///
/// Only `Donation` reduces taxable income in the engine; other kinds are
/// accepted at the boundary and ignored by the calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllowanceKind {
    Donation,
    KReceipt,
}

impl AllowanceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Donation => "donation",
            Self::KReceipt => "k-receipt",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "donation" => Some(Self::Donation),
            "k-receipt" => Some(Self::KReceipt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allowance {
    pub kind: AllowanceKind,
    pub amount: Decimal,
}

impl Allowance {
    pub fn donation(amount: Decimal) -> Self {
        Self {
            kind: AllowanceKind::Donation,
            amount,
        }
    }
}
