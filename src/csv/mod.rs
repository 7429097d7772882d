//! CSV ingestion of budget and salary sheets, and CSV rendering of results.

use std::path::PathBuf;

use thiserror::Error;

mod budget;
mod output;
mod report;
mod salary;

pub use budget::read_budget_lines;
pub use output::{
    BUDGET_COLUMNS, SUMMARY_COLUMNS, TRANSFER_COLUMNS, write_budget, write_budget_by_unit,
    write_summary, write_transfers,
};
pub use report::read_budget_report;
pub use salary::read_disbursements;

/// Errors that can occur when reading or writing csv tables
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("cannot open {}: {source}", path.display())]
    Open { path: PathBuf, source: csv::Error },

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: invalid {field} '{value}'")]
    InvalidCode {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("failed to write csv: {0}")]
    Write(#[from] csv::Error),

    #[error("failed to write csv: {0}")]
    Io(#[from] std::io::Error),
}
