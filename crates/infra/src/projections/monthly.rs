//! Monthly aggregate maintainer.
//!
//! Totals are moved by signed deltas only. Each `(company, month)` key is
//! serialized through `KeyedLocks`, and the store applies each delta as one
//! read-modify-write, so concurrent publishes touching the same month do not
//! lose updates.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use ledgersync_accounting::{AccountingLogEntry, EntryKind, FinancialRecord, MonthlyAggregate};
use ledgersync_core::{CompanyId, Money, MonthKey};

use crate::locks::KeyedLocks;
use crate::read_model::{MonthlyAggregateStore, StoreResult};

pub struct MonthlyAggregateMaintainer {
    store: Arc<dyn MonthlyAggregateStore>,
    locks: KeyedLocks<(CompanyId, MonthKey)>,
}

impl MonthlyAggregateMaintainer {
    pub fn new(store: Arc<dyn MonthlyAggregateStore>) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
        }
    }

    /// Add a signed delta to one month's income or expense total. The first
    /// delta for a month creates the aggregate with a zero prior balance.
    pub fn apply(
        &self,
        company: CompanyId,
        month: MonthKey,
        kind: EntryKind,
        delta: Money,
        now: DateTime<Utc>,
    ) -> StoreResult<MonthlyAggregate> {
        self.locks.with_lock((company, month), || {
            let agg = self.store.apply_delta(company, month, kind, delta, now)?;
            debug!(month = %month, kind = %kind, delta = %delta, balance = %agg.balance, "monthly aggregate moved");
            Ok(agg)
        })
    }

    pub fn on_created(&self, record: &FinancialRecord, now: DateTime<Utc>) -> StoreResult<()> {
        self.apply(record.company_id, record.month(), record.kind, record.amount(), now)?;
        Ok(())
    }

    /// Move the aggregate from `previous` to `current`.
    ///
    /// Same month and kind: one delta of `current - previous`. Otherwise the old
    /// amount comes out of its month and the new amount goes into its month.
    pub fn on_updated(
        &self,
        previous: &FinancialRecord,
        current: &FinancialRecord,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let company = current.company_id;
        if previous.month() == current.month() && previous.kind == current.kind {
            let delta = current.amount() - previous.amount();
            if !delta.is_zero() {
                self.apply(company, current.month(), current.kind, delta, now)?;
            }
            return Ok(());
        }

        self.apply(company, previous.month(), previous.kind, -previous.amount(), now)?;
        self.apply(company, current.month(), current.kind, current.amount(), now)?;
        Ok(())
    }

    /// Reverse the amount a log entry added, in the month it was added to.
    pub fn on_deleted(&self, source: &AccountingLogEntry, now: DateTime<Utc>) -> StoreResult<()> {
        self.apply(source.company_id, source.month, source.kind, -source.amount, now)?;
        Ok(())
    }

    /// Copy the previous month's closing balance into `month`'s prior balance.
    ///
    /// Never called by the sync pipeline; prior balances stay at zero unless a
    /// caller asks for this explicitly.
    ///
    /// Holds the previous month's lock while copying, so no delta lands between
    /// the read and the write. Locks are taken older month first.
    pub fn carry_forward(
        &self,
        company: CompanyId,
        month: MonthKey,
        now: DateTime<Utc>,
    ) -> StoreResult<MonthlyAggregate> {
        let previous = month.previous();
        self.locks.with_lock((company, previous), || {
            let carried = self
                .store
                .get(company, previous)?
                .map(|prev| prev.closing_balance())
                .unwrap_or(Money::ZERO);

            self.locks.with_lock((company, month), || {
                if self.store.get(company, month)?.is_none() {
                    self.store.apply_delta(company, month, EntryKind::Income, Money::ZERO, now)?;
                }
                self.store.set_prior_balance(company, month, carried, now)
            })
        })
    }

    pub fn get(&self, company: CompanyId, month: MonthKey) -> StoreResult<Option<MonthlyAggregate>> {
        self.store.get(company, month)
    }

    pub fn list(&self, company: CompanyId) -> StoreResult<Vec<MonthlyAggregate>> {
        self.store.list(company)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ledgersync_accounting::{RecordDetails, RecordDraft, RecordSource, SettlementStatus};
    use ledgersync_core::ReferenceId;
    use proptest::prelude::*;

    use crate::read_model::InMemoryMonthlyAggregateStore;

    fn maintainer() -> MonthlyAggregateMaintainer {
        MonthlyAggregateMaintainer::new(Arc::new(InMemoryMonthlyAggregateStore::new()))
    }

    fn month(s: &str) -> MonthKey {
        s.parse().unwrap()
    }

    fn money(value: f64) -> Money {
        Money::from_decimal(value).unwrap()
    }

    fn record(company: CompanyId, kind: EntryKind, amount: Money, m: u32) -> FinancialRecord {
        FinancialRecord::from_draft(
            company,
            RecordDraft {
                reference_id: ReferenceId::new(),
                kind,
                source: RecordSource::Payment,
                details: RecordDetails {
                    description: "x".to_string(),
                    date: NaiveDate::from_ymd_opt(2024, m, 1).unwrap(),
                    amount,
                    category: None,
                    counterparty: None,
                    payment_method: None,
                    document_number: None,
                },
                status: SettlementStatus::Pending,
                installment_count: None,
            },
            Utc::now(),
        )
    }

    #[test]
    fn first_delta_seeds_with_zero_prior_balance() {
        let m = maintainer();
        let company = CompanyId::new();
        let agg = m.apply(company, month("2024-05"), EntryKind::Expense, money(80.0), Utc::now()).unwrap();
        assert_eq!(agg.total_expense, money(80.0));
        assert_eq!(agg.balance, money(-80.0));
        assert_eq!(agg.prior_balance, Money::ZERO);
    }

    #[test]
    fn update_across_months_moves_the_amount() {
        let m = maintainer();
        let company = CompanyId::new();
        let before = record(company, EntryKind::Income, money(100.0), 3);
        let mut after = before.clone();
        after.details.date = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        after.details.amount = money(120.0);

        m.on_created(&before, Utc::now()).unwrap();
        m.on_updated(&before, &after, Utc::now()).unwrap();

        let march = m.get(company, month("2024-03")).unwrap().unwrap();
        let april = m.get(company, month("2024-04")).unwrap().unwrap();
        assert_eq!(march.total_income, Money::ZERO);
        assert_eq!(april.total_income, money(120.0));
        assert!(march.is_consistent() && april.is_consistent());
    }

    #[test]
    fn carry_forward_is_explicit() {
        let m = maintainer();
        let company = CompanyId::new();
        m.apply(company, month("2024-01"), EntryKind::Income, money(500.0), Utc::now()).unwrap();
        m.apply(company, month("2024-02"), EntryKind::Income, money(10.0), Utc::now()).unwrap();

        assert_eq!(m.get(company, month("2024-02")).unwrap().unwrap().prior_balance, Money::ZERO);

        let feb = m.carry_forward(company, month("2024-02"), Utc::now()).unwrap();
        assert_eq!(feb.prior_balance, money(500.0));
        assert_eq!(feb.closing_balance(), money(510.0));

        let mar = m.carry_forward(company, month("2024-03"), Utc::now()).unwrap();
        assert_eq!(mar.prior_balance, money(510.0));
        assert_eq!(mar.balance, Money::ZERO);
    }

    #[test]
    fn carry_forward_after_concurrent_deltas_releases_both_locks() {
        let m = Arc::new(maintainer());
        let company = CompanyId::new();
        let jan = month("2024-01");
        let feb = month("2024-02");

        let writers: Vec<_> = (0..4)
            .map(|_| {
                let m = m.clone();
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        m.apply(company, jan, EntryKind::Income, Money::from_cents(1), Utc::now()).unwrap();
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }

        let carried = m.carry_forward(company, feb, Utc::now()).unwrap();
        assert_eq!(carried.prior_balance, Money::from_cents(200));
        assert_eq!(m.locks.active_keys(), 0);
    }

    proptest! {
        #[test]
        fn incremental_totals_match_recomputation(
            ops in proptest::collection::vec((any::<bool>(), 1u32..=3, 1u32..100_000, any::<bool>()), 1..30)
        ) {
            let m = maintainer();
            let company = CompanyId::new();
            let now = Utc::now();
            let mut live: Vec<FinancialRecord> = Vec::new();

            for (income, mon, cents, delete_first) in ops {
                if delete_first && !live.is_empty() {
                    let gone = live.remove(0);
                    m.apply(company, gone.month(), gone.kind, -gone.amount(), now).unwrap();
                }
                let kind = if income { EntryKind::Income } else { EntryKind::Expense };
                let r = record(company, kind, Money::from_cents(i64::from(cents)), mon);
                m.on_created(&r, now).unwrap();
                live.push(r);
            }

            for mon in 1..=3 {
                let key = MonthKey::new(2024, mon).unwrap();
                let expected = MonthlyAggregate::recompute(company, key, live.iter(), now);
                if let Some(actual) = m.get(company, key).unwrap() {
                    prop_assert_eq!(actual.total_income, expected.total_income);
                    prop_assert_eq!(actual.total_expense, expected.total_expense);
                    prop_assert!(actual.is_consistent());
                }
            }
        }
    }
}
