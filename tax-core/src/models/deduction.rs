use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Named deduction amounts kept in the config store.
///
/// `Donation` holds the cap applied to donation allowances, not a flat deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeductionKind {
    Personal,
    Donation,
    KReceipt,
}

impl DeductionKind {
    pub const ALL: [DeductionKind; 3] = [Self::Personal, Self::Donation, Self::KReceipt];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Donation => "donation",
            Self::KReceipt => "k-receipt",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "personal" => Some(Self::Personal),
            "donation" => Some(Self::Donation),
            "k-receipt" => Some(Self::KReceipt),
            _ => None,
        }
    }

    /// Amount seeded into a fresh config store.
    pub fn default_amount(&self) -> Decimal {
        match self {
            Self::Personal => dec!(60000.00),
            Self::Donation => dec!(100000.00),
            Self::KReceipt => dec!(50000.00),
        }
    }
}

impl std::fmt::Display for DeductionKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    pub kind: DeductionKind,
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parse_round_trips_every_kind() {
        for kind in DeductionKind::ALL {
            assert_eq!(DeductionKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn parse_rejects_unknown_name() {
        assert_eq!(DeductionKind::parse("donation-cap"), None);
        assert_eq!(DeductionKind::parse("Personal"), None);
    }

    #[test]
    fn default_amounts() {
        assert_eq!(DeductionKind::Personal.default_amount(), dec!(60000));
        assert_eq!(DeductionKind::Donation.default_amount(), dec!(100000));
        assert_eq!(DeductionKind::KReceipt.default_amount(), dec!(50000));
    }

    #[test]
    fn serde_uses_store_names() {
        let json = serde_json::to_string(&DeductionKind::KReceipt).unwrap();

        assert_eq!(json, "\"k-receipt\"");
    }
}
