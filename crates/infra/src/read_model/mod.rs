//! Company-isolated read model storage.
//!
//! Each projection table has a narrow trait (what the projectors actually need)
//! and an in-memory implementation for tests/dev. Relational backends implement
//! the same traits outside this crate.

pub mod accounting_log;
pub mod calendar;
pub mod company_table;
pub mod forecasts;
pub mod installments;
pub mod monthly;
pub mod payroll;
pub mod records;
pub mod stock_alerts;

use thiserror::Error;

pub use accounting_log::{AccountingLogStore, InMemoryAccountingLog};
pub use calendar::{CalendarStore, InMemoryCalendarStore};
pub use company_table::CompanyTable;
pub use forecasts::{ForecastStore, InMemoryForecastStore};
pub use installments::{InMemoryInstallmentStore, InstallmentStore};
pub use monthly::{InMemoryMonthlyAggregateStore, MonthlyAggregateStore};
pub use payroll::{InMemoryPayrollSource, PayrollSource, PayrollSummary};
pub use records::{InMemoryRecordStore, RecordStore};
pub use stock_alerts::{InMemoryStockAlertStore, StockAlertStore};

/// Storage operation error.
///
/// These are **infrastructure errors**; projectors log them and move on, the
/// next event for the same reference re-derives the state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("unique key already exists: {0}")]
    Conflict(String),

    #[error("row not found: {0}")]
    NotFound(String),

    #[error("store lock poisoned")]
    Poisoned,

    /// Transient backend failure (connection, timeout).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
