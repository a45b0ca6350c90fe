use ledgersync_accounting::StockAlert;
use ledgersync_core::{CompanyId, ReferenceId};

use super::{CompanyTable, StoreResult};

pub trait StockAlertStore: Send + Sync {
    /// Replace the alert for the item with the latest one.
    fn upsert(&self, alert: StockAlert) -> StoreResult<()>;
    fn list(&self, company: CompanyId) -> StoreResult<Vec<StockAlert>>;
}

#[derive(Debug, Default)]
pub struct InMemoryStockAlertStore {
    rows: CompanyTable<ReferenceId, StockAlert>,
}

impl InMemoryStockAlertStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StockAlertStore for InMemoryStockAlertStore {
    fn upsert(&self, alert: StockAlert) -> StoreResult<()> {
        self.rows.upsert(alert.company_id, alert.item_id, alert)?;
        Ok(())
    }

    fn list(&self, company: CompanyId) -> StoreResult<Vec<StockAlert>> {
        self.rows.list(company)
    }
}
