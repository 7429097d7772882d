//! Budget ledger: the single mutable store of available balances.
//!
//! Lines live in an arena ordered by (unit, category), with a key index on
//! top. Callers read through [`BudgetLedger::lookup`] and
//! [`BudgetLedger::eligible_donors`]; [`BudgetLedger::debit`] is the only
//! mutator.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

use crate::Amount;
use crate::model::{BudgetLine, CategoryCode, Tier, UnitCode};

mod error;
pub use error::LedgerError;

type LineKey = (UnitCode, CategoryCode);

/// A donor candidate as seen at selection time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Donor {
    pub unit: UnitCode,
    pub balance: Amount,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetLedger {
    lines: Vec<BudgetLine>,
    index: HashMap<LineKey, usize>,
}

impl BudgetLedger {
    /// Build the ledger from raw line occurrences.
    ///
    /// Occurrences sharing a key are merged: balances are summed and the
    /// first non-empty description is kept. No input yields an empty ledger.
    pub fn build(lines: impl IntoIterator<Item = BudgetLine>) -> Self {
        let mut grouped: BTreeMap<LineKey, BudgetLine> = BTreeMap::new();

        for line in lines {
            match grouped.entry((line.unit.clone(), line.category.clone())) {
                Entry::Vacant(slot) => {
                    slot.insert(line);
                }
                Entry::Occupied(mut slot) => {
                    let merged = slot.get_mut();
                    merged.available += line.available;
                    if merged.description.is_empty() {
                        merged.description = line.description;
                    }
                }
            }
        }

        let index = grouped
            .keys()
            .enumerate()
            .map(|(pos, key)| (key.clone(), pos))
            .collect();
        let lines = grouped.into_values().collect();

        Self { lines, index }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Lines in ledger order.
    pub fn lines(&self) -> impl Iterator<Item = &BudgetLine> + '_ {
        self.lines.iter()
    }

    /// Current balance of a line, `None` if the line does not exist.
    pub fn lookup(&self, unit: &UnitCode, category: &CategoryCode) -> Option<Amount> {
        self.position(unit, category).map(|pos| self.lines[pos].available)
    }

    /// Decrease a line's balance and return the new balance.
    pub fn debit(
        &mut self,
        unit: &UnitCode,
        category: &CategoryCode,
        amount: Amount,
    ) -> Result<Amount, LedgerError> {
        if amount.is_negative() {
            return Err(LedgerError::NegativeDebit(amount));
        }

        let pos = self
            .position(unit, category)
            .ok_or_else(|| LedgerError::UnknownLine(unit.clone(), category.clone()))?;
        let line = &mut self.lines[pos];

        if line.available < amount {
            return Err(LedgerError::Overdraw {
                unit: unit.clone(),
                category: category.clone(),
                available: line.available,
                requested: amount,
            });
        }

        line.available -= amount;
        Ok(line.available)
    }

    /// Lines of `category` in `tier` that could fund `receiver`, largest
    /// balance first. Equal balances keep ledger order.
    pub fn eligible_donors(
        &self,
        category: &CategoryCode,
        receiver: &UnitCode,
        tier: Tier,
    ) -> Vec<Donor> {
        let mut donors: Vec<Donor> = self
            .lines
            .iter()
            .filter(|line| {
                &line.category == category
                    && &line.unit != receiver
                    && line.unit.tier() == tier
                    && line.available.is_positive()
            })
            .map(|line| Donor {
                unit: line.unit.clone(),
                balance: line.available,
            })
            .collect();

        // stable: ties stay in ledger order
        donors.sort_by(|a, b| b.balance.cmp(&a.balance));
        donors
    }

    fn position(&self, unit: &UnitCode, category: &CategoryCode) -> Option<usize> {
        self.index.get(&(unit.clone(), category.clone())).copied()
    }
}
