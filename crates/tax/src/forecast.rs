use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use ledgersync_core::{CompanyId, MonthKey};

use crate::compute::{TaxFigures, round_cents};

/// Persisted forecast snapshot. History is append-only; the freshest row for a
/// `(company, month)` is the one with the latest `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxForecast {
    pub company_id: CompanyId,
    pub month: MonthKey,
    pub vat_payable: f64,
    pub trade_tax: f64,
    pub corp_tax: f64,
    pub payroll_tax: f64,
    pub created_at: DateTime<Utc>,
}

impl TaxForecast {
    /// Snapshot of computed figures, rounded to cents.
    pub fn from_figures(
        company_id: CompanyId,
        month: MonthKey,
        figures: &TaxFigures,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            company_id,
            month,
            vat_payable: round_cents(figures.vat.payable),
            trade_tax: round_cents(figures.trade_tax),
            corp_tax: round_cents(figures.corporate_tax.total),
            payroll_tax: round_cents(figures.payroll_tax),
            created_at,
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.created_at) < ttl
    }

    pub fn total(&self) -> f64 {
        round_cents(self.vat_payable + self.trade_tax + self.corp_tax + self.payroll_tax)
    }
}
