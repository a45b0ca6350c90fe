//! Tax arithmetic for the monthly forecast.
//!
//! Pure functions over monthly totals and a company tax profile; no storage,
//! no clock. The infra layer feeds these from the ledger and persists results.

pub mod compute;
pub mod forecast;
pub mod profile;

pub use compute::{
    CorporateTax, MonthlyTotals, TaxFigures, Vat, compute_all, compute_corporate_tax,
    compute_payroll_tax, compute_trade_tax, compute_vat, round_cents,
};
pub use forecast::TaxForecast;
pub use profile::{CompanyType, TaxProfile};
