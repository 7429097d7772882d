//! Error types for disbursement processing.

use thiserror::Error;

use crate::ledger::LedgerError;

/// Top-level error returned by the [`Engine`](super::Engine).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no budget lines found in budget source")]
    EmptyBudgetSource,

    #[error("ledger update failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("replaying {transfers} transfers does not reproduce the final ledger")]
    ReplayMismatch { transfers: usize },
}
