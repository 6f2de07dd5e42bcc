use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A contiguous income band taxed at a single marginal rate.
///
/// `max_income` is `None` for the top band, which has no upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub label: String,
    pub min_income: Decimal,
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxBracket {
    /// Width of the band, or `None` when it is unbounded.
    pub fn width(&self) -> Option<Decimal> {
        self.max_income.map(|max| max - self.min_income)
    }

    /// Portion of `remaining` income that falls inside this band.
    pub fn income_within(
        &self,
        remaining: Decimal,
    ) -> Decimal {
        match self.width() {
            Some(width) => remaining.min(width),
            None => remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn bracket(max_income: Option<Decimal>) -> TaxBracket {
        TaxBracket {
            label: "150,001-500,000".to_string(),
            min_income: dec!(150000),
            max_income,
            rate: dec!(0.10),
        }
    }

    #[test]
    fn width_of_bounded_bracket() {
        assert_eq!(bracket(Some(dec!(500000))).width(), Some(dec!(350000)));
    }

    #[test]
    fn width_of_unbounded_bracket_is_none() {
        assert_eq!(bracket(None).width(), None);
    }

    #[test]
    fn income_within_clamps_to_width() {
        assert_eq!(
            bracket(Some(dec!(500000))).income_within(dec!(400000)),
            dec!(350000)
        );
        assert_eq!(
            bracket(Some(dec!(500000))).income_within(dec!(1000)),
            dec!(1000)
        );
    }

    #[test]
    fn income_within_unbounded_takes_everything() {
        assert_eq!(bracket(None).income_within(dec!(9999999)), dec!(9999999));
    }
}
