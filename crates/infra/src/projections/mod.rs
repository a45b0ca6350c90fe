//! Projectors (read model builders).
//!
//! Each projector owns one read model and is:
//! - **Company-isolated**: every row is keyed by `CompanyId`
//! - **Idempotent**: safe under at-least-once delivery
//! - **Independent**: a failure in one never blocks the others

pub mod accounting_log;
pub mod calendar;
pub mod installments;
pub mod ledger;
pub mod monthly;
pub mod stock_alerts;

pub use accounting_log::AccountingLogProjector;
pub use calendar::CalendarProjector;
pub use installments::{InstallmentError, InstallmentProjector, MaterializedPlan};
pub use ledger::{LedgerChange, LedgerProjector, ReferenceLocks};
pub use monthly::MonthlyAggregateMaintainer;
pub use stock_alerts::StockAlertProjector;
