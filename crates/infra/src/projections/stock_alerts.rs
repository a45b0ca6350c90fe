//! Low-stock alerts, latest per inventory item.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use ledgersync_accounting::{InventoryBelowMinimumPayload, StockAlert};
use ledgersync_core::CompanyId;

use crate::read_model::{StockAlertStore, StoreResult};

pub struct StockAlertProjector {
    store: Arc<dyn StockAlertStore>,
}

impl StockAlertProjector {
    pub fn new(store: Arc<dyn StockAlertStore>) -> Self {
        Self { store }
    }

    pub fn raise(
        &self,
        company: CompanyId,
        payload: &InventoryBelowMinimumPayload,
        now: DateTime<Utc>,
    ) -> StoreResult<StockAlert> {
        let alert = StockAlert {
            company_id: company,
            item_id: payload.item_id,
            item_name: payload.item_name.clone(),
            current_quantity: payload.current_quantity,
            minimum_quantity: payload.minimum_quantity,
            raised_at: now,
        };
        info!(item_id = %alert.item_id, shortfall = alert.shortfall(), "stock below minimum");
        self.store.upsert(alert.clone())?;
        Ok(alert)
    }

    pub fn alerts(&self, company: CompanyId) -> StoreResult<Vec<StockAlert>> {
        self.store.list(company)
    }
}
