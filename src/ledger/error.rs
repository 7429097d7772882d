//! Error types for budget ledger mutation.

use thiserror::Error;

use crate::Amount;
use crate::model::{CategoryCode, UnitCode};

/// Error returned by [`BudgetLedger::debit`](super::BudgetLedger::debit).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("no budget line for {0}/{1}")]
    UnknownLine(UnitCode, CategoryCode),

    #[error("debit of {requested} exceeds balance {available} on {unit}/{category}")]
    Overdraw {
        unit: UnitCode,
        category: CategoryCode,
        available: Amount,
        requested: Amount,
    },

    #[error("negative debit {0} rejected")]
    NegativeDebit(Amount),
}
