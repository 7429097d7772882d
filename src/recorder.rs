//! Append-only record of every disbursement outcome and donor draw.

use crate::Amount;
use crate::ledger::{BudgetLedger, LedgerError};
use crate::model::{DisbursementOutcome, TransferRecord};

/// Disbursement summary plus the transfer ledger, both in processing order.
#[derive(Debug, Default)]
pub struct LedgerRecorder {
    outcomes: Vec<DisbursementOutcome>,
    transfers: Vec<TransferRecord>,
}

impl LedgerRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outcomes recorded so far; also the index of the next request.
    pub fn next_request(&self) -> usize {
        self.outcomes.len()
    }

    /// Append one outcome together with the draws that produced it.
    pub fn record(
        &mut self,
        outcome: DisbursementOutcome,
        transfers: Vec<TransferRecord>,
    ) -> &DisbursementOutcome {
        self.transfers.extend(transfers);
        self.outcomes.push(outcome);
        &self.outcomes[self.outcomes.len() - 1]
    }

    pub fn outcomes(&self) -> &[DisbursementOutcome] {
        &self.outcomes
    }

    pub fn transfers(&self) -> &[TransferRecord] {
        &self.transfers
    }

    /// Draws made for the `request`-th disbursement.
    pub fn transfers_for(&self, request: usize) -> impl Iterator<Item = &TransferRecord> + '_ {
        self.transfers.iter().filter(move |t| t.request == request)
    }

    pub fn total_diverted(&self) -> Amount {
        self.transfers.iter().map(|t| t.diverted).sum()
    }

    /// Apply every recorded draw, in order, as a debit on a copy of `initial`.
    pub fn replay(&self, initial: &BudgetLedger) -> Result<BudgetLedger, LedgerError> {
        let mut ledger = initial.clone();
        for transfer in &self.transfers {
            ledger.debit(&transfer.donor, &transfer.category, transfer.diverted)?;
        }
        Ok(ledger)
    }
}
