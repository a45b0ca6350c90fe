use chrono::{DateTime, Utc};

use ledgersync_accounting::{EntryKind, MonthlyAggregate};
use ledgersync_core::{CompanyId, Money, MonthKey};

use super::{CompanyTable, StoreError, StoreResult};

/// Monthly totals storage.
pub trait MonthlyAggregateStore: Send + Sync {
    fn get(&self, company: CompanyId, month: MonthKey) -> StoreResult<Option<MonthlyAggregate>>;

    /// Atomically add `delta` to the month, creating it (prior balance 0) if absent.
    fn apply_delta(
        &self,
        company: CompanyId,
        month: MonthKey,
        kind: EntryKind,
        delta: Money,
        now: DateTime<Utc>,
    ) -> StoreResult<MonthlyAggregate>;

    fn set_prior_balance(
        &self,
        company: CompanyId,
        month: MonthKey,
        prior_balance: Money,
        now: DateTime<Utc>,
    ) -> StoreResult<MonthlyAggregate>;

    /// All months of a company, oldest first.
    fn list(&self, company: CompanyId) -> StoreResult<Vec<MonthlyAggregate>>;
}

#[derive(Debug, Default)]
pub struct InMemoryMonthlyAggregateStore {
    rows: CompanyTable<MonthKey, MonthlyAggregate>,
}

impl InMemoryMonthlyAggregateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MonthlyAggregateStore for InMemoryMonthlyAggregateStore {
    fn get(&self, company: CompanyId, month: MonthKey) -> StoreResult<Option<MonthlyAggregate>> {
        self.rows.get(company, &month)
    }

    fn apply_delta(
        &self,
        company: CompanyId,
        month: MonthKey,
        kind: EntryKind,
        delta: Money,
        now: DateTime<Utc>,
    ) -> StoreResult<MonthlyAggregate> {
        self.rows.upsert_with(company, month, |existing| match existing {
            Some(mut agg) => {
                agg.apply_delta(kind, delta, now);
                agg
            }
            None => MonthlyAggregate::seeded(company, month, kind, delta, now),
        })
    }

    fn set_prior_balance(
        &self,
        company: CompanyId,
        month: MonthKey,
        prior_balance: Money,
        now: DateTime<Utc>,
    ) -> StoreResult<MonthlyAggregate> {
        let mut agg = self
            .rows
            .get(company, &month)?
            .ok_or_else(|| StoreError::NotFound(format!("monthly aggregate {month}")))?;
        agg.prior_balance = prior_balance;
        agg.updated_at = now;
        self.rows.replace(company, month, agg.clone())?;
        Ok(agg)
    }

    fn list(&self, company: CompanyId) -> StoreResult<Vec<MonthlyAggregate>> {
        let mut rows = self.rows.list(company)?;
        rows.sort_by_key(|a| a.month);
        Ok(rows)
    }
}
