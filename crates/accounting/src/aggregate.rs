use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ledgersync_core::{CompanyId, Money, MonthKey};

use crate::record::{EntryKind, FinancialRecord};

/// Read model: running totals for one company and calendar month.
///
/// Maintained incrementally by signed deltas, never recomputed. Amounts are
/// integer cents, so after every delta `balance == total_income - total_expense`
/// holds exactly.
///
/// `prior_balance` is seeded at zero and only changes through an explicit
/// carry-forward; it is not part of `balance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    pub company_id: CompanyId,
    pub month: MonthKey,
    pub total_income: Money,
    pub total_expense: Money,
    pub balance: Money,
    pub prior_balance: Money,
    pub updated_at: DateTime<Utc>,
}

impl MonthlyAggregate {
    pub fn empty(company_id: CompanyId, month: MonthKey, now: DateTime<Utc>) -> Self {
        Self {
            company_id,
            month,
            total_income: Money::ZERO,
            total_expense: Money::ZERO,
            balance: Money::ZERO,
            prior_balance: Money::ZERO,
            updated_at: now,
        }
    }

    /// A fresh aggregate seeded with the first amount seen for the month.
    pub fn seeded(
        company_id: CompanyId,
        month: MonthKey,
        kind: EntryKind,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Self {
        let mut agg = Self::empty(company_id, month, now);
        agg.apply_delta(kind, amount, now);
        agg
    }

    /// Add `delta` to the matching total and move the balance with it
    /// (up for income, down for expense).
    pub fn apply_delta(&mut self, kind: EntryKind, delta: Money, now: DateTime<Utc>) {
        match kind {
            EntryKind::Income => {
                self.total_income += delta;
                self.balance += delta;
            }
            EntryKind::Expense => {
                self.total_expense += delta;
                self.balance -= delta;
            }
        }
        self.updated_at = now;
    }

    /// Balance including whatever was carried in from the previous month.
    pub fn closing_balance(&self) -> Money {
        self.prior_balance + self.balance
    }

    pub fn is_consistent(&self) -> bool {
        self.balance == self.total_income - self.total_expense
    }

    /// Build the aggregate a full recomputation over live records would give.
    ///
    /// Not used on the hot path; it is the reference the incremental deltas are
    /// checked against.
    pub fn recompute<'a>(
        company_id: CompanyId,
        month: MonthKey,
        records: impl IntoIterator<Item = &'a FinancialRecord>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut agg = Self::empty(company_id, month, now);
        for r in records
            .into_iter()
            .filter(|r| r.company_id == company_id && r.month() == month)
        {
            agg.apply_delta(r.kind, r.amount(), now);
        }
        agg
    }
}
