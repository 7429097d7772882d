use crate::Amount;
use crate::model::{CategoryCode, Contribution, TransferRecord, UnitCode};

/// Fixed facts about the disbursement being funded.
#[derive(Debug)]
pub struct DrawContext {
    pub request: usize,
    pub receiver: UnitCode,
    pub category: CategoryCode,
    pub required: Amount,
    pub original: Amount,
}

/// Accumulator threaded through every donor draw of one disbursement.
#[derive(Debug)]
pub struct DrawState {
    remaining: Amount,
    diverted: Amount,
    transfers: Vec<TransferRecord>,
}

impl DrawState {
    pub fn new(shortfall: Amount) -> Self {
        Self {
            remaining: shortfall,
            diverted: Amount::ZERO,
            transfers: Vec::new(),
        }
    }

    pub fn remaining(&self) -> Amount {
        self.remaining
    }

    pub fn diverted(&self) -> Amount {
        self.diverted
    }

    pub fn is_settled(&self) -> bool {
        !self.remaining.is_positive()
    }

    /// Fold one draw into the state.
    pub fn draw(mut self, transfer: TransferRecord) -> Self {
        self.remaining -= transfer.diverted;
        self.diverted += transfer.diverted;
        self.transfers.push(transfer);
        self
    }

    pub fn contributions(&self) -> Vec<Contribution> {
        self.transfers.iter().map(Contribution::from).collect()
    }

    pub fn into_transfers(self) -> Vec<TransferRecord> {
        self.transfers
    }
}
