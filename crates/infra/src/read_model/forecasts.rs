use std::sync::RwLock;

use ledgersync_core::{CompanyId, MonthKey};
use ledgersync_tax::TaxForecast;

use super::{StoreError, StoreResult};

/// Append-only forecast history.
pub trait ForecastStore: Send + Sync {
    fn insert(&self, forecast: TaxForecast) -> StoreResult<()>;

    /// Freshest forecast for the month (latest `created_at`).
    fn latest(&self, company: CompanyId, month: MonthKey) -> StoreResult<Option<TaxForecast>>;

    /// Every forecast for the month, oldest first.
    fn history(&self, company: CompanyId, month: MonthKey) -> StoreResult<Vec<TaxForecast>>;
}

#[derive(Debug, Default)]
pub struct InMemoryForecastStore {
    rows: RwLock<Vec<TaxForecast>>,
}

impl InMemoryForecastStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ForecastStore for InMemoryForecastStore {
    fn insert(&self, forecast: TaxForecast) -> StoreResult<()> {
        let mut rows = self.rows.write().map_err(|_| StoreError::Poisoned)?;
        rows.push(forecast);
        Ok(())
    }

    fn latest(&self, company: CompanyId, month: MonthKey) -> StoreResult<Option<TaxForecast>> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        Ok(rows
            .iter()
            .filter(|f| f.company_id == company && f.month == month)
            .max_by_key(|f| f.created_at)
            .cloned())
    }

    fn history(&self, company: CompanyId, month: MonthKey) -> StoreResult<Vec<TaxForecast>> {
        let rows = self.rows.read().map_err(|_| StoreError::Poisoned)?;
        let mut found: Vec<TaxForecast> = rows
            .iter()
            .filter(|f| f.company_id == company && f.month == month)
            .cloned()
            .collect();
        found.sort_by_key(|f| f.created_at);
        Ok(found)
    }
}
