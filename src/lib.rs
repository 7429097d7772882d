pub mod amount;
pub mod csv;
pub mod engine;
pub mod ledger;
pub mod model;
pub mod recorder;

pub use amount::Amount;
pub use engine::{Engine, EngineError};
pub use ledger::{BudgetLedger, LedgerError};
pub use model::{
    BudgetLine, CategoryCode, DisbursementOutcome, DisbursementRequest, OutcomeStatus, Tier,
    TransferRecord, UnitCode,
};
pub use recorder::LedgerRecorder;
