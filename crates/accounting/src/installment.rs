use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ledgersync_core::{DomainError, Money, RecordId};

use crate::events::InstallmentPlanLine;

/// One installment of a parent ledger record.
///
/// `paid_date` is `Some` iff `paid` is true; `mark_paid` is the only way to flip it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub parent_id: RecordId,
    /// 1-based, unique within the parent.
    pub sequence: u32,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub paid: bool,
    pub paid_date: Option<NaiveDate>,
}

impl Installment {
    pub fn from_plan(parent_id: RecordId, line: &InstallmentPlanLine) -> Self {
        let mut installment = Self {
            parent_id,
            sequence: line.sequence,
            amount: line.amount,
            due_date: line.due_date,
            paid: false,
            paid_date: None,
        };
        if line.paid {
            installment.mark_paid(line.paid_date.unwrap_or(line.due_date));
        }
        installment
    }

    pub fn mark_paid(&mut self, on: NaiveDate) {
        self.paid = true;
        self.paid_date = Some(on);
    }
}

/// Check an installment plan against its parent amount.
///
/// Sequences must be exactly `1..=n` (in any order) and the amounts must sum to
/// the parent amount exactly. Callers decide whether a violation is fatal;
/// the sync engine only warns.
pub fn validate_installments(
    parent_amount: Money,
    plan: &[InstallmentPlanLine],
) -> Result<(), DomainError> {
    if plan.is_empty() {
        return Err(DomainError::validation("installment plan is empty"));
    }

    let mut sequences: Vec<u32> = plan.iter().map(|l| l.sequence).collect();
    sequences.sort_unstable();
    let contiguous = sequences
        .iter()
        .enumerate()
        .all(|(idx, seq)| *seq as usize == idx + 1);
    if !contiguous {
        return Err(DomainError::invariant(format!(
            "installment sequences must be contiguous from 1, got {sequences:?}"
        )));
    }

    let total: Money = plan.iter().map(|l| l.amount).sum();
    if total != parent_amount {
        return Err(DomainError::invariant(format!(
            "installments sum to {total}, parent amount is {parent_amount}"
        )));
    }

    Ok(())
}
