mod allowance;
mod calculation;
mod deduction;
mod request;
mod tax_bracket;

pub use allowance::{Allowance, AllowanceKind};
pub use calculation::{BracketTax, CalculationInput, CalculationResult, Settlement};
pub use deduction::{Deduction, DeductionKind};
pub use request::{AllowanceRequest, CalculationRequest};
pub use tax_bracket::TaxBracket;
