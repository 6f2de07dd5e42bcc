//! Progressive income tax engine.
//!
//! The engine turns a [`CalculationInput`] and a [`DeductionConfig`] snapshot
//! into the tax owed or refunded:
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Sum donation allowances and cap them at the configured donation cap |
//! | 2    | Taxable income = total income - personal deduction - capped donations |
//! | 3    | Walk the brackets in ascending order, taxing the slice of income in each |
//! | 4    | Subtract withheld tax; a negative balance is a refund |
//! | 5    | Round every reported amount to two places, half away from zero |
//!
//! Withholding is a flat credit applied after apportionment, so the bracket
//! breakdown always reflects pre-withholding tax.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::{BracketSchedule, DeductionConfig, TaxEngine};
//! use tax_core::{Allowance, CalculationInput, DeductionKind};
//!
//! let config = DeductionConfig::new()
//!     .with(DeductionKind::Personal, dec!(60000))
//!     .with(DeductionKind::Donation, dec!(100000));
//!
//! let input = CalculationInput {
//!     total_income: dec!(500000),
//!     withheld_tax: dec!(100000),
//!     allowances: vec![Allowance::donation(dec!(200000))],
//! };
//!
//! let engine = TaxEngine::new(BracketSchedule::standard());
//! let result = engine.calculate(&config, &input);
//!
//! assert_eq!(result.tax_due, dec!(0));
//! assert_eq!(result.refund, dec!(81000.00));
//! assert_eq!(result.bracket_breakdown[1].tax, dec!(19000.00));
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::calculations::common::{max, round_half_up};
use crate::calculations::{BracketSchedule, DeductionConfig};
use crate::{
    Allowance, AllowanceKind, BracketTax, CalculationInput, CalculationResult, DeductionKind,
    Settlement,
};

/// Taxable income before clamping. May be negative.
pub fn compute_taxable_income(
    total_income: Decimal,
    personal_deduction: Decimal,
    capped_donation_allowance: Decimal,
) -> Decimal {
    total_income - personal_deduction - capped_donation_allowance
}

/// Sums every donation allowance, then caps the total at `donation_cap`.
///
/// The cap applies to the category as a whole, not to each entry. Allowances
/// of other kinds are ignored.
pub fn cap_donation_allowance(
    allowances: &[Allowance],
    donation_cap: Decimal,
) -> Decimal {
    let donated = allowances
        .iter()
        .filter(|a| a.kind == AllowanceKind::Donation)
        .fold(Decimal::ZERO, |total, a| total.saturating_add(a.amount));

    donated.min(donation_cap)
}

/// Unrounded tax for every bracket plus their total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketApportionment {
    pub total_tax: Decimal,
    pub per_bracket: Vec<BracketTax>,
}

/// Stateless calculator bound to a bracket schedule.
#[derive(Debug, Clone, Copy)]
pub struct TaxEngine<'a> {
    schedule: &'a BracketSchedule,
}

impl TaxEngine<'static> {
    /// Engine over [`BracketSchedule::standard`].
    pub fn standard() -> Self {
        Self::new(BracketSchedule::standard())
    }
}

impl<'a> TaxEngine<'a> {
    pub fn new(schedule: &'a BracketSchedule) -> Self {
        Self { schedule }
    }

    /// Full calculation: net tax or refund plus the per-bracket breakdown.
    pub fn calculate(
        &self,
        config: &DeductionConfig,
        input: &CalculationInput,
    ) -> CalculationResult {
        let taxable_income = self.taxable_income(config, input);
        let apportionment = self.apply_brackets(taxable_income);
        let settlement = settle(apportionment.total_tax, input.withheld_tax);

        debug!(
            %taxable_income,
            pre_withholding_tax = %apportionment.total_tax,
            tax_due = %settlement.tax_due,
            refund = %settlement.refund,
            "tax calculated"
        );

        CalculationResult {
            tax_due: settlement.tax_due,
            refund: settlement.refund,
            bracket_breakdown: apportionment
                .per_bracket
                .into_iter()
                .map(|level| BracketTax {
                    tax: round_half_up(level.tax),
                    ..level
                })
                .collect(),
        }
    }

    /// Net tax or refund only, without building the breakdown.
    pub fn settle(
        &self,
        config: &DeductionConfig,
        input: &CalculationInput,
    ) -> Settlement {
        let taxable_income = self.taxable_income(config, input);
        settle(self.total_tax(taxable_income), input.withheld_tax)
    }

    /// Taxable income for `input` under `config`, before clamping at zero.
    pub fn taxable_income(
        &self,
        config: &DeductionConfig,
        input: &CalculationInput,
    ) -> Decimal {
        let donation_allowance = cap_donation_allowance(
            &input.allowances,
            config.amount_for(DeductionKind::Donation),
        );

        compute_taxable_income(
            input.total_income,
            config.amount_for(DeductionKind::Personal),
            donation_allowance,
        )
    }

    /// Apportions taxable income across every bracket.
    ///
    /// Always produces one entry per bracket; brackets above the income
    /// contribute zero. Negative taxable income is treated as zero.
    pub fn apply_brackets(
        &self,
        taxable_income: Decimal,
    ) -> BracketApportionment {
        let mut remaining = max(taxable_income, Decimal::ZERO);
        let mut total_tax = Decimal::ZERO;
        let mut per_bracket = Vec::with_capacity(self.schedule.len());

        for bracket in self.schedule.brackets_ordered() {
            let income_in_bracket = bracket.income_within(remaining);
            let tax_in_bracket = income_in_bracket * bracket.rate;

            total_tax += tax_in_bracket;
            remaining -= income_in_bracket;
            per_bracket.push(BracketTax {
                label: bracket.label.clone(),
                tax: tax_in_bracket,
            });
        }

        BracketApportionment {
            total_tax,
            per_bracket,
        }
    }

    /// Total pre-withholding tax, stopping once income is exhausted.
    pub fn total_tax(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        let mut remaining = max(taxable_income, Decimal::ZERO);
        let mut total_tax = Decimal::ZERO;

        for bracket in self.schedule.brackets_ordered() {
            if remaining <= Decimal::ZERO {
                break;
            }
            let income_in_bracket = bracket.income_within(remaining);
            total_tax += income_in_bracket * bracket.rate;
            remaining -= income_in_bracket;
        }

        total_tax
    }
}

/// Credits withheld tax against computed tax and rounds the result.
fn settle(
    tax: Decimal,
    withheld_tax: Decimal,
) -> Settlement {
    let net = tax - withheld_tax;

    if net < Decimal::ZERO {
        Settlement {
            tax_due: Decimal::ZERO,
            refund: round_half_up(-net),
        }
    } else {
        Settlement {
            tax_due: round_half_up(net),
            refund: Decimal::ZERO,
        }
    }
}
