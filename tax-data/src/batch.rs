//! CSV batch evaluation.
//!
//! A batch is a CSV stream with the header `totalIncome,wht,donation`
//! followed by one taxpayer per row. Every row is evaluated against the same
//! [`DeductionConfig`] snapshot. The first row that fails to parse or
//! validate aborts the whole batch; no partial report is produced.

use std::fmt;
use std::io::Read;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tax_core::{
    AllowanceKind, AllowanceRequest, CalculationRequest, DeductionConfig, TaxEngine,
    ValidationErrors, validate_calculation_request,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Column names a batch must start with, in order.
pub const BATCH_HEADER: [&str; 3] = ["totalIncome", "wht", "donation"];

/// One column of a batch row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchField {
    TotalIncome,
    Wht,
    Donation,
}

impl BatchField {
    pub const ALL: [BatchField; 3] = [Self::TotalIncome, Self::Wht, Self::Donation];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TotalIncome => "totalIncome",
            Self::Wht => "wht",
            Self::Donation => "donation",
        }
    }
}

impl fmt::Display for BatchField {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a batch is rejected. Row numbers count data rows from 1,
/// excluding the header.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: CSV read error: {source}")]
    CsvRow { row: usize, source: csv::Error },

    #[error("missing header: expected '{expected}'", expected = BATCH_HEADER.join(","))]
    MissingHeader,

    #[error("invalid header '{0}': expected '{expected}'", expected = BATCH_HEADER.join(","))]
    InvalidHeader(String),

    #[error("row {row}: expected {expected} columns, found {found}", expected = BATCH_HEADER.len())]
    ColumnCount { row: usize, found: usize },

    #[error("row {row}: field '{field}' is not a number: '{value}'")]
    InvalidField {
        row: usize,
        field: BatchField,
        value: String,
    },

    #[error("row {row}: {violations}")]
    InvalidRow {
        row: usize,
        violations: ValidationErrors,
    },
}

impl BatchError {
    /// Data row the error refers to, if any.
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::CsvRow { row, .. }
            | Self::ColumnCount { row, .. }
            | Self::InvalidField { row, .. }
            | Self::InvalidRow { row, .. } => Some(*row),
            Self::Csv(_) | Self::MissingHeader | Self::InvalidHeader(_) => None,
        }
    }
}

/// Tax owed for one batch row. Refund rows report zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRowResult {
    #[serde(rename = "totalIncome", with = "rust_decimal::serde::float")]
    pub total_income: Decimal,

    #[serde(rename = "tax", with = "rust_decimal::serde::float")]
    pub tax_due: Decimal,
}

/// Results for every row, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub taxes: Vec<BatchRowResult>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.taxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taxes.is_empty()
    }
}

/// Applies one [`TaxEngine`] to every row of a batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchRunner<'a> {
    engine: TaxEngine<'a>,
}

impl BatchRunner<'static> {
    pub fn standard() -> Self {
        Self::new(TaxEngine::standard())
    }
}

impl<'a> BatchRunner<'a> {
    pub fn new(engine: TaxEngine<'a>) -> Self {
        Self { engine }
    }

    /// Reads a CSV batch, checks its header, and evaluates every row.
    pub fn run<R: Read>(
        &self,
        config: &DeductionConfig,
        reader: R,
    ) -> Result<BatchReport, BatchError> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut records = csv_reader.records();
        let header = records.next().ok_or(BatchError::MissingHeader)??;
        check_header(&header)?;

        // Rows are pulled lazily so a bad row stops reading the rest.
        let mut taxes = Vec::new();
        for (index, record) in records.enumerate() {
            let row = index + 1;
            let record = record.map_err(|source| {
                warn!(row, %source, "batch row is not readable");
                BatchError::CsvRow { row, source }
            })?;
            taxes.push(self.evaluate_row(config, row, &record)?);
        }

        info!(rows = taxes.len(), "batch evaluated");
        Ok(BatchReport { taxes })
    }

    /// Evaluates already-split rows, without a header.
    pub fn run_rows<I>(
        &self,
        config: &DeductionConfig,
        rows: I,
    ) -> Result<BatchReport, BatchError>
    where
        I: IntoIterator<Item = StringRecord>,
    {
        let taxes = rows
            .into_iter()
            .enumerate()
            .map(|(index, record)| self.evaluate_row(config, index + 1, &record))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BatchReport { taxes })
    }

    fn evaluate_row(
        &self,
        config: &DeductionConfig,
        row: usize,
        record: &StringRecord,
    ) -> Result<BatchRowResult, BatchError> {
        if record.len() != BATCH_HEADER.len() {
            warn!(row, found = record.len(), "batch row has wrong column count");
            return Err(BatchError::ColumnCount {
                row,
                found: record.len(),
            });
        }

        let [total_income, wht, donation] =
            BatchField::ALL.map(|field| parse_field(row, field, &record[field_index(field)]));
        let (total_income, wht, donation) = (total_income?, wht?, donation?);

        let request = CalculationRequest {
            total_income: Some(total_income),
            wht,
            allowances: vec![AllowanceRequest {
                allowance_type: AllowanceKind::Donation.as_str().to_string(),
                amount: donation,
            }],
        };
        let input = validate_calculation_request(&request).map_err(|violations| {
            warn!(row, %violations, "batch row rejected");
            BatchError::InvalidRow { row, violations }
        })?;

        let settlement = self.engine.settle(config, &input);
        debug!(row, %total_income, tax_due = %settlement.tax_due, "batch row evaluated");

        Ok(BatchRowResult {
            total_income,
            tax_due: settlement.tax_due,
        })
    }
}

fn field_index(field: BatchField) -> usize {
    match field {
        BatchField::TotalIncome => 0,
        BatchField::Wht => 1,
        BatchField::Donation => 2,
    }
}

fn check_header(header: &StringRecord) -> Result<(), BatchError> {
    if header.iter().eq(BATCH_HEADER) {
        Ok(())
    } else {
        let found = header.iter().collect::<Vec<_>>().join(",");
        warn!(header = %found, "batch header rejected");
        Err(BatchError::InvalidHeader(found))
    }
}

fn parse_field(
    row: usize,
    field: BatchField,
    value: &str,
) -> Result<Decimal, BatchError> {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| {
            warn!(row, %field, value, "batch field is not a number");
            BatchError::InvalidField {
                row,
                field,
                value: value.to_string(),
            }
        })
}
