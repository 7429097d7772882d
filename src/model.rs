//! Core domain types for the diversion engine.

use std::fmt;
use std::str::FromStr;

use crate::Amount;

/// Fund center code, `[FG]` followed by four digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitCode(String);

impl UnitCode {
    /// Parse a well-formed fund center code.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let mut chars = raw.chars();
        let tier_ok = matches!(chars.next(), Some('F' | 'G'));
        let digits_ok = raw.len() == 5 && chars.all(|c| c.is_ascii_digit());
        (tier_ok && digits_ok).then(|| UnitCode(raw.to_string()))
    }

    /// Normalize a raw receiver code the way salary sheets write it:
    /// codes already tagged `F`/`G` are kept, bare codes belong to tier `F`.
    pub fn normalize_receiver(raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with(['F', 'G']) {
            raw.to_string()
        } else {
            format!("F{raw}")
        }
    }

    pub fn tier(&self) -> Tier {
        if self.0.starts_with('G') {
            Tier::Fallback
        } else {
            Tier::Primary
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Commitment (expense category) code, an uppercase letter and five digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryCode(String);

impl CategoryCode {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let mut chars = raw.chars();
        let letter_ok = chars.next().is_some_and(|c| c.is_ascii_uppercase());
        let digits_ok = raw.len() == 6 && chars.all(|c| c.is_ascii_digit());
        (letter_ok && digits_ok).then(|| CategoryCode(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CategoryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Donor pool a fund center belongs to, encoded by its leading letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// `F` units, drained first.
    Primary,
    /// `G` units, drained once the primary pool is exhausted.
    Fallback,
}

impl Tier {
    pub fn prefix(self) -> char {
        match self {
            Tier::Primary => 'F',
            Tier::Fallback => 'G',
        }
    }

    /// Default draw order.
    pub fn ordered() -> Vec<Tier> {
        vec![Tier::Primary, Tier::Fallback]
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "f" | "primary" => Ok(Tier::Primary),
            "g" | "fallback" => Ok(Tier::Fallback),
            other => Err(format!("unknown tier '{other}', expected F or G")),
        }
    }
}

/// One budget line: available balance of a category within a fund center.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetLine {
    pub unit: UnitCode,
    pub category: CategoryCode,
    pub description: String,
    pub available: Amount,
}

/// A required salary disbursement, as read from the salary sheet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisbursementRequest {
    pub particular: String,
    /// Raw `BA CODE`, not yet normalized.
    pub unit: String,
    pub category: String,
    pub gl_code: String,
    pub amount: Amount,
}

/// One draw from a donor line into a receiver's shortfall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    /// Position of the disbursement this draw served, in processing order.
    pub request: usize,
    pub tier: Tier,
    pub receiver: UnitCode,
    pub donor: UnitCode,
    pub category: CategoryCode,
    pub required: Amount,
    pub receiver_original: Amount,
    pub diverted: Amount,
    pub donor_before: Amount,
    pub donor_after: Amount,
}

/// Final state of a disbursement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Receiver line missing from the budget; no diversion attempted.
    Unbudgeted,
    /// Own balance was enough.
    Covered,
    /// Shortfall fully diverted from donors.
    Resolved,
    /// Donors ran dry before the shortfall was covered.
    Unresolved,
}

/// Per-donor contribution to a single disbursement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub donor: UnitCode,
    pub amount: Amount,
    pub balance_after: Amount,
}

impl From<&TransferRecord> for Contribution {
    fn from(transfer: &TransferRecord) -> Self {
        Self {
            donor: transfer.donor.clone(),
            amount: transfer.diverted,
            balance_after: transfer.donor_after,
        }
    }
}

/// Allocation figures for a receiver present in the budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub original: Amount,
    pub difference: Amount,
    pub diverted: Amount,
    pub contributions: Vec<Contribution>,
}

impl Allocation {
    pub fn final_difference(&self) -> Amount {
        self.difference + self.diverted
    }
}

/// Result of processing one [`DisbursementRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisbursementOutcome {
    pub request: DisbursementRequest,
    /// Normalized receiver code.
    pub receiver: String,
    /// `None` when the receiver line is not in the budget.
    pub allocation: Option<Allocation>,
}

impl DisbursementOutcome {
    pub fn status(&self) -> OutcomeStatus {
        match &self.allocation {
            None => OutcomeStatus::Unbudgeted,
            Some(a) if !a.difference.is_negative() => OutcomeStatus::Covered,
            Some(a) if a.final_difference().is_negative() => OutcomeStatus::Unresolved,
            Some(_) => OutcomeStatus::Resolved,
        }
    }

    pub fn original_balance(&self) -> Option<Amount> {
        self.allocation.as_ref().map(|a| a.original)
    }

    pub fn difference(&self) -> Option<Amount> {
        self.allocation.as_ref().map(|a| a.difference)
    }

    pub fn diverted(&self) -> Option<Amount> {
        self.allocation.as_ref().map(|a| a.diverted)
    }

    pub fn final_difference(&self) -> Option<Amount> {
        self.allocation.as_ref().map(Allocation::final_difference)
    }
}
