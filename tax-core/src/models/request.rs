use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Calculation request as it arrives at the boundary, before validation.
///
/// Field names follow the JSON wire format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRequest {
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_income: Option<Decimal>,

    #[serde(default, with = "rust_decimal::serde::float")]
    pub wht: Decimal,

    #[serde(default)]
    pub allowances: Vec<AllowanceRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowanceRequest {
    pub allowance_type: String,

    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn deserializes_wire_json() {
        let json = r#"{
            "totalIncome": 500000.0,
            "wht": 0.0,
            "allowances": [{"allowanceType": "donation", "amount": 200000.0}]
        }"#;

        let request: CalculationRequest = serde_json::from_str(json).unwrap();

        assert_eq!(request.total_income, Some(dec!(500000)));
        assert_eq!(request.wht, dec!(0));
        assert_eq!(
            request.allowances,
            vec![AllowanceRequest {
                allowance_type: "donation".to_string(),
                amount: dec!(200000),
            }]
        );
    }

    #[test]
    fn missing_fields_default() {
        let request: CalculationRequest = serde_json::from_str("{}").unwrap();

        assert_eq!(request, CalculationRequest::default());
    }
}
