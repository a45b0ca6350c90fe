//! Accounting read-model domain (ledger records, installments, monthly totals).
//!
//! Pure domain logic only: no IO, no locking, no persistence concerns.

pub mod aggregate;
pub mod calendar;
pub mod events;
pub mod installment;
pub mod log;
pub mod record;
pub mod stock;

pub use aggregate::MonthlyAggregate;
pub use calendar::{CalendarEntry, CalendarSource, CalendarStatus};
pub use events::{
    EmployeePaymentCancelled, EmployeePaymentPayload, EntryPayload, InstallmentEntryPayload,
    InstallmentPaidPayload, InstallmentPlanLine, InventoryBelowMinimumPayload,
    InventoryMovementPayload, MovementDirection, PaymentDirection, PaymentPayload, PaymentStatus,
    ReferenceDeleted, SyncEvent,
};
pub use installment::{Installment, validate_installments};
pub use log::{AccountingLogEntry, LogAction};
pub use record::{EntryKind, FinancialRecord, RecordDetails, RecordDraft, RecordSource, SettlementStatus};
pub use stock::StockAlert;
