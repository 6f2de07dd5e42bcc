//! Tax calculation: bracket schedule, deduction lookup and the engine.

pub mod brackets;
pub mod common;
pub mod deductions;
pub mod engine;

pub use brackets::{BracketSchedule, BracketScheduleError};
pub use deductions::{DeductionConfig, MissingDeductions};
pub use engine::{BracketApportionment, TaxEngine, cap_donation_allowance, compute_taxable_income};
