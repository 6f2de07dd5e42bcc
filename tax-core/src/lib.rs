pub mod calculations;
pub mod db;
pub mod models;
pub mod validation;

pub use calculations::{BracketSchedule, DeductionConfig, MissingDeductions, TaxEngine};
pub use db::repository::{DeductionRepository, RepositoryError};
pub use models::*;
pub use validation::{
    FieldViolation, ValidationErrors, validate_calculation_request, validate_deduction_update,
};
