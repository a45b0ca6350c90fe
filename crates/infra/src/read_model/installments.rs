use ledgersync_accounting::Installment;
use ledgersync_core::{CompanyId, RecordId};

use super::{CompanyTable, StoreResult};

/// Installment storage, unique on `(parent_id, sequence)`.
pub trait InstallmentStore: Send + Sync {
    fn insert_installment(&self, company: CompanyId, installment: Installment) -> StoreResult<()>;

    /// All installments of a parent, ordered by sequence.
    fn installments_for(&self, company: CompanyId, parent: RecordId) -> StoreResult<Vec<Installment>>;

    fn update_installment(&self, company: CompanyId, installment: Installment) -> StoreResult<()>;

    fn delete_installments_for(&self, company: CompanyId, parent: RecordId) -> StoreResult<usize>;
}

#[derive(Debug, Default)]
pub struct InMemoryInstallmentStore {
    rows: CompanyTable<(RecordId, u32), Installment>,
}

impl InMemoryInstallmentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InstallmentStore for InMemoryInstallmentStore {
    fn insert_installment(&self, company: CompanyId, installment: Installment) -> StoreResult<()> {
        self.rows.insert_new(
            company,
            (installment.parent_id, installment.sequence),
            installment,
        )
    }

    fn installments_for(&self, company: CompanyId, parent: RecordId) -> StoreResult<Vec<Installment>> {
        let mut rows = self.rows.list_where(company, |(p, _), _| *p == parent)?;
        rows.sort_by_key(|i| i.sequence);
        Ok(rows)
    }

    fn update_installment(&self, company: CompanyId, installment: Installment) -> StoreResult<()> {
        self.rows.replace(
            company,
            (installment.parent_id, installment.sequence),
            installment,
        )
    }

    fn delete_installments_for(&self, company: CompanyId, parent: RecordId) -> StoreResult<usize> {
        self.rows.remove_where(company, |(p, _), _| *p == parent)
    }
}
