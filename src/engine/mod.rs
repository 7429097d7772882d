//! Budget diversion engine.
//!
//! The engine owns the budget ledger and processes salary disbursements one
//! at a time, in arrival order. A disbursement whose receiver line cannot
//! cover it drains donor lines of the same category, tier by tier, largest
//! balance first. Every draw is recorded so the final ledger can be
//! reconstructed from the initial one.
//! Also supports async stream of disbursements.

use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::Amount;
use crate::ledger::{BudgetLedger, LedgerError};
use crate::model::{
    Allocation, CategoryCode, DisbursementOutcome, DisbursementRequest, OutcomeStatus, Tier,
    TransferRecord, UnitCode,
};
use crate::recorder::LedgerRecorder;

mod state;
pub use state::{DrawContext, DrawState};

mod error;
pub use error::EngineError;

/// The diversion engine.
pub struct Engine {
    ledger: BudgetLedger,
    /// Budget as built: receivers are measured against it, replay starts from it
    initial: BudgetLedger,
    /// Donor pools in draw order
    tiers: Vec<Tier>,
    recorder: LedgerRecorder,
}

/// Public API
impl Engine {
    /// Create an engine over a built ledger. An empty ledger is rejected so
    /// no disbursement is ever processed against an empty budget source.
    pub fn new(ledger: BudgetLedger) -> Result<Self, EngineError> {
        if ledger.is_empty() {
            return Err(EngineError::EmptyBudgetSource);
        }
        Ok(Self {
            initial: ledger.clone(),
            ledger,
            tiers: Tier::ordered(),
            recorder: LedgerRecorder::new(),
        })
    }

    /// Override the donor tier order.
    pub fn with_tiers(mut self, tiers: Vec<Tier>) -> Self {
        self.tiers = tiers;
        self
    }

    /// Run the engine with the given disbursement stream
    pub async fn run(&mut self, mut stream: impl Stream<Item = DisbursementRequest> + Unpin) {
        while let Some(request) = stream.next().await {
            // a failed disbursement must not stop the run
            if let Err(e) = self.process(request) {
                warn!(reason = %e, "disbursement skipped");
            }
        }
    }

    /// Current (live) ledger.
    pub fn ledger(&self) -> &BudgetLedger {
        &self.ledger
    }

    /// Ledger as it was before any disbursement.
    pub fn initial_ledger(&self) -> &BudgetLedger {
        &self.initial
    }

    pub fn recorder(&self) -> &LedgerRecorder {
        &self.recorder
    }

    /// Process a single disbursement on top of the current ledger state
    pub fn process(
        &mut self,
        request: DisbursementRequest,
    ) -> Result<&DisbursementOutcome, EngineError> {
        let index = self.recorder.next_request();
        let receiver = UnitCode::normalize_receiver(&request.unit);

        // receivers are measured against the budget as built, donors against
        // the live ledger
        let found = UnitCode::parse(&receiver)
            .zip(CategoryCode::parse(&request.category))
            .and_then(|(unit, category)| {
                let original = self.initial.lookup(&unit, &category)?;
                Some((unit, category, original))
            });

        let Some((unit, category, original)) = found else {
            info!(
                receiver = %receiver,
                category = %request.category,
                required = %request.amount,
                "receiver not in budget, no diversion"
            );
            let outcome = DisbursementOutcome {
                request,
                receiver,
                allocation: None,
            };
            return Ok(self.recorder.record(outcome, Vec::new()));
        };

        let difference = original - request.amount;
        let mut state = DrawState::new(Amount::ZERO);

        if difference.is_negative() {
            let ctx = DrawContext {
                request: index,
                receiver: unit,
                category,
                required: request.amount,
                original,
            };
            state = self.divert(&ctx, -difference)?;
        }

        let allocation = Allocation {
            original,
            difference,
            diverted: state.diverted(),
            contributions: state.contributions(),
        };
        let outcome = DisbursementOutcome {
            request,
            receiver,
            allocation: Some(allocation),
        };
        Self::log_outcome(&outcome);

        Ok(self.recorder.record(outcome, state.into_transfers()))
    }

    /// Check that replaying the transfer ledger on the initial budget
    /// reproduces the live ledger.
    pub fn verify_replay(&self) -> Result<(), EngineError> {
        let replayed = self.recorder.replay(&self.initial)?;
        if replayed != self.ledger {
            return Err(EngineError::ReplayMismatch {
                transfers: self.recorder.transfers().len(),
            });
        }
        Ok(())
    }
}

/// Private API
impl Engine {
    /// Small helper to log `process` results
    fn log_outcome(outcome: &DisbursementOutcome) {
        let Some(allocation) = &outcome.allocation else {
            return;
        };
        match outcome.status() {
            OutcomeStatus::Unresolved => warn!(
                receiver = %outcome.receiver,
                category = %outcome.request.category,
                diverted = %allocation.diverted,
                final_difference = %allocation.final_difference(),
                "donors exhausted before shortfall was covered"
            ),
            status => info!(
                receiver = %outcome.receiver,
                category = %outcome.request.category,
                required = %outcome.request.amount,
                diverted = %allocation.diverted,
                ?status,
                "disbursement processed"
            ),
        }
    }

    /// Cover `shortfall` from the donor tiers, in order. A tier is only
    /// consulted while some shortfall remains.
    fn divert(&mut self, ctx: &DrawContext, shortfall: Amount) -> Result<DrawState, LedgerError> {
        let tiers = self.tiers.clone();
        tiers
            .into_iter()
            .try_fold(DrawState::new(shortfall), |state, tier| {
                if state.is_settled() {
                    return Ok(state);
                }
                self.drain_tier(ctx, tier, state)
            })
    }

    /// Draw from one tier's donors, largest balance first, until the
    /// shortfall is covered or the tier runs dry.
    fn drain_tier(
        &mut self,
        ctx: &DrawContext,
        tier: Tier,
        state: DrawState,
    ) -> Result<DrawState, LedgerError> {
        let donors = self
            .ledger
            .eligible_donors(&ctx.category, &ctx.receiver, tier);

        donors.into_iter().try_fold(state, |state, donor| {
            if state.is_settled() {
                return Ok(state);
            }

            let take = donor.balance.min(state.remaining());
            let after = self.ledger.debit(&donor.unit, &ctx.category, take)?;

            debug!(
                receiver = %ctx.receiver,
                donor = %donor.unit,
                category = %ctx.category,
                amount = %take,
                donor_after = %after,
                "diverted"
            );

            Ok(state.draw(TransferRecord {
                request: ctx.request,
                tier,
                receiver: ctx.receiver.clone(),
                donor: donor.unit,
                category: ctx.category.clone(),
                required: ctx.required,
                receiver_original: ctx.original,
                diverted: take,
                donor_before: donor.balance,
                donor_after: after,
            }))
        })
    }
}
