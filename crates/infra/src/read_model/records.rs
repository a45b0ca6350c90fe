use ledgersync_accounting::{EntryKind, FinancialRecord};
use ledgersync_core::{CompanyId, MonthKey, ReferenceId};

use super::{CompanyTable, StoreResult};

/// Ledger record storage, unique on `(company, reference_id, kind)`.
pub trait RecordStore: Send + Sync {
    fn find_by_reference(
        &self,
        company: CompanyId,
        reference: ReferenceId,
        kind: EntryKind,
    ) -> StoreResult<Option<FinancialRecord>>;

    /// Every record for a reference regardless of kind (bare-id deletions).
    fn find_any_by_reference(
        &self,
        company: CompanyId,
        reference: ReferenceId,
    ) -> StoreResult<Vec<FinancialRecord>>;

    /// Fails with `StoreError::Conflict` if the idempotency key is taken.
    fn insert(&self, record: FinancialRecord) -> StoreResult<()>;

    /// Fails with `StoreError::NotFound` if the record does not exist.
    fn update(&self, record: FinancialRecord) -> StoreResult<()>;

    fn delete(
        &self,
        company: CompanyId,
        reference: ReferenceId,
        kind: EntryKind,
    ) -> StoreResult<Option<FinancialRecord>>;

    fn list_for_month(&self, company: CompanyId, month: MonthKey) -> StoreResult<Vec<FinancialRecord>>;
}

#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    rows: CompanyTable<(ReferenceId, EntryKind), FinancialRecord>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn find_by_reference(
        &self,
        company: CompanyId,
        reference: ReferenceId,
        kind: EntryKind,
    ) -> StoreResult<Option<FinancialRecord>> {
        self.rows.get(company, &(reference, kind))
    }

    fn find_any_by_reference(
        &self,
        company: CompanyId,
        reference: ReferenceId,
    ) -> StoreResult<Vec<FinancialRecord>> {
        let mut found = self.rows.list_where(company, |(r, _), _| *r == reference)?;
        found.sort_by_key(|r| r.kind);
        Ok(found)
    }

    fn insert(&self, record: FinancialRecord) -> StoreResult<()> {
        self.rows.insert_new(
            record.company_id,
            (record.reference_id, record.kind),
            record,
        )
    }

    fn update(&self, record: FinancialRecord) -> StoreResult<()> {
        self.rows.replace(
            record.company_id,
            (record.reference_id, record.kind),
            record,
        )
    }

    fn delete(
        &self,
        company: CompanyId,
        reference: ReferenceId,
        kind: EntryKind,
    ) -> StoreResult<Option<FinancialRecord>> {
        self.rows.remove(company, &(reference, kind))
    }

    fn list_for_month(&self, company: CompanyId, month: MonthKey) -> StoreResult<Vec<FinancialRecord>> {
        let mut rows = self.rows.list_where(company, |_, r| r.month() == month)?;
        rows.sort_by_key(|r| (r.details.date, r.created_at));
        Ok(rows)
    }
}
