use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ledgersync_core::{CompanyId, ReferenceId};

/// Read model: latest low-stock alert per inventory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockAlert {
    pub company_id: CompanyId,
    pub item_id: ReferenceId,
    pub item_name: String,
    pub current_quantity: f64,
    pub minimum_quantity: f64,
    pub raised_at: DateTime<Utc>,
}

impl StockAlert {
    pub fn shortfall(&self) -> f64 {
        (self.minimum_quantity - self.current_quantity).max(0.0)
    }
}
