//! Deduction config snapshots and name-based lookup.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{Deduction, DeductionKind};

/// One or more deductions required by the caller are absent from a snapshot.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("deduction not configured: {}", join_kinds(.0))]
pub struct MissingDeductions(pub Vec<DeductionKind>);

fn join_kinds(kinds: &[DeductionKind]) -> String {
    kinds
        .iter()
        .map(DeductionKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read-only snapshot of the configured deduction amounts.
///
/// Built fresh from the config store for every calculation (or once per
/// batch); the engine never mutates or caches it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeductionConfig {
    amounts: BTreeMap<DeductionKind, Decimal>,
}

impl DeductionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the snapshot with `kind` set to `amount`.
    pub fn with(
        mut self,
        kind: DeductionKind,
        amount: Decimal,
    ) -> Self {
        self.amounts.insert(kind, amount);
        self
    }

    /// Amount configured for `kind`, or zero when it was never configured.
    pub fn amount_for(
        &self,
        kind: DeductionKind,
    ) -> Decimal {
        self.amounts.get(&kind).copied().unwrap_or(Decimal::ZERO)
    }

    /// Checks that every kind in `kinds` has a configured amount.
    ///
    /// # Errors
    ///
    /// Returns [`MissingDeductions`] listing each absent kind.
    pub fn require(
        &self,
        kinds: &[DeductionKind],
    ) -> Result<(), MissingDeductions> {
        let missing: Vec<DeductionKind> = kinds
            .iter()
            .copied()
            .filter(|kind| !self.amounts.contains_key(kind))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(MissingDeductions(missing))
        }
    }
}

impl FromIterator<Deduction> for DeductionConfig {
    fn from_iter<I: IntoIterator<Item = Deduction>>(iter: I) -> Self {
        Self {
            amounts: iter.into_iter().map(|d| (d.kind, d.amount)).collect(),
        }
    }
}
