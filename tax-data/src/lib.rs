pub mod batch;

pub use batch::{BATCH_HEADER, BatchError, BatchField, BatchReport, BatchRowResult, BatchRunner};
