//! The progressive bracket schedule.
//!
//! A [`BracketSchedule`] is an ordered, contiguous set of [`TaxBracket`]s
//! whose last band is unbounded. Schedules are immutable once built; the
//! standard five-band table is a lazily initialised process-wide value.

use std::sync::LazyLock;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

use crate::TaxBracket;

/// Reasons a list of brackets cannot form a schedule.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BracketScheduleError {
    #[error("no tax brackets provided")]
    Empty,

    #[error("first bracket must start at zero, found {0}")]
    NonZeroStart(Decimal),

    #[error("bracket '{label}' does not start where the previous one ends ({expected})")]
    Gap { label: String, expected: Decimal },

    #[error("bracket '{0}' has an upper bound that is not above its lower bound")]
    EmptyBand(String),

    #[error("bracket '{0}' is unbounded but is not the last bracket")]
    UnboundedBeforeEnd(String),

    #[error("last bracket '{0}' must be unbounded")]
    BoundedTop(String),

    #[error("bracket '{label}' has rate {rate} outside [0, 1]")]
    RateOutOfRange { label: String, rate: Decimal },
}

/// Ordered, contiguous progressive brackets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketSchedule {
    brackets: Vec<TaxBracket>,
}

static STANDARD: LazyLock<BracketSchedule> = LazyLock::new(|| BracketSchedule {
    brackets: vec![
        band("0-150,000", dec!(0), Some(dec!(150000)), dec!(0)),
        band("150,001-500,000", dec!(150000), Some(dec!(500000)), dec!(0.10)),
        band("500,001-1,000,000", dec!(500000), Some(dec!(1000000)), dec!(0.15)),
        band("1,000,001-2,000,000", dec!(1000000), Some(dec!(2000000)), dec!(0.20)),
        band("2,000,001 ขึ้นไป", dec!(2000000), None, dec!(0.35)),
    ],
});

fn band(
    label: &str,
    min_income: Decimal,
    max_income: Option<Decimal>,
    rate: Decimal,
) -> TaxBracket {
    TaxBracket {
        label: label.to_string(),
        min_income,
        max_income,
        rate,
    }
}

impl BracketSchedule {
    /// Builds a schedule, checking that the brackets are ordered, contiguous
    /// from zero, end in a single unbounded band and carry rates in `[0, 1]`.
    pub fn try_new(brackets: Vec<TaxBracket>) -> Result<Self, BracketScheduleError> {
        let first = brackets.first().ok_or(BracketScheduleError::Empty)?;
        if first.min_income != Decimal::ZERO {
            return Err(BracketScheduleError::NonZeroStart(first.min_income));
        }

        let last_index = brackets.len() - 1;
        let mut expected_start = Decimal::ZERO;
        for (index, bracket) in brackets.iter().enumerate() {
            if bracket.min_income != expected_start {
                return Err(BracketScheduleError::Gap {
                    label: bracket.label.clone(),
                    expected: expected_start,
                });
            }
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(BracketScheduleError::RateOutOfRange {
                    label: bracket.label.clone(),
                    rate: bracket.rate,
                });
            }
            match bracket.max_income {
                Some(max) if max <= bracket.min_income => {
                    return Err(BracketScheduleError::EmptyBand(bracket.label.clone()));
                }
                Some(_) if index == last_index => {
                    return Err(BracketScheduleError::BoundedTop(bracket.label.clone()));
                }
                Some(max) => expected_start = max,
                None if index != last_index => {
                    return Err(BracketScheduleError::UnboundedBeforeEnd(
                        bracket.label.clone(),
                    ));
                }
                None => {}
            }
        }

        Ok(Self { brackets })
    }

    /// The five-band schedule used by this system.
    pub fn standard() -> &'static BracketSchedule {
        &STANDARD
    }

    /// Brackets in ascending order of `min_income`.
    pub fn brackets_ordered(&self) -> &[TaxBracket] {
        &self.brackets
    }

    pub fn len(&self) -> usize {
        self.brackets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brackets.is_empty()
    }
}
