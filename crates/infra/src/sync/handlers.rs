//! Dispatcher handlers, one per read model family.

use std::sync::Arc;

use tracing::debug;

use ledgersync_accounting::{EntryKind, SyncEvent};
use ledgersync_events::{EventHandler, HandlerResult};

use crate::projections::{CalendarProjector, StockAlertProjector};

use super::{FinancialSync, SyncEnvelope};

/// Ledger, accounting log, monthly aggregate and installment materialization.
pub struct LedgerHandler {
    sync: Arc<FinancialSync>,
}

impl LedgerHandler {
    pub const NAME: &'static str = "ledger";

    /// Every event name this handler projects.
    pub const EVENTS: [&'static str; 12] = [
        SyncEvent::PAYMENT_CREATED,
        SyncEvent::PAYMENT_UPDATED,
        SyncEvent::PAYMENT_DELETED,
        SyncEvent::INCOME_ENTRY_CREATED,
        SyncEvent::INCOME_ENTRY_UPDATED,
        SyncEvent::INCOME_ENTRY_DELETED,
        SyncEvent::INCOME_INSTALLMENTS_CREATED,
        SyncEvent::EXPENSE_ENTRY_CREATED,
        SyncEvent::EXPENSE_ENTRY_UPDATED,
        SyncEvent::EXPENSE_ENTRY_DELETED,
        SyncEvent::EXPENSE_INSTALLMENTS_CREATED,
        SyncEvent::INVENTORY_MOVEMENT_RECORDED,
    ];

    pub fn new(sync: Arc<FinancialSync>) -> Self {
        Self { sync }
    }
}

impl EventHandler<SyncEnvelope> for LedgerHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn handle(&self, envelope: &SyncEnvelope) -> HandlerResult {
        let company = envelope.company_id();
        let now = envelope.occurred_at();
        let event = envelope.payload();
        let snapshot = serde_json::to_value(event)?;

        match event {
            SyncEvent::PaymentCreated(p) => {
                self.sync.create(company, p.to_draft(), snapshot, now)?;
            }
            SyncEvent::PaymentUpdated(p) => {
                self.sync.update(company, p.to_draft(), snapshot, now)?;
            }
            SyncEvent::PaymentDeleted(d) => {
                self.sync.delete(company, d.reference_id, None, snapshot, now)?;
            }
            SyncEvent::IncomeEntryCreated(p) => {
                self.sync.create(company, p.to_draft(EntryKind::Income), snapshot, now)?;
            }
            SyncEvent::IncomeEntryUpdated(p) => {
                self.sync.update(company, p.to_draft(EntryKind::Income), snapshot, now)?;
            }
            SyncEvent::IncomeEntryDeleted(d) => {
                self.sync
                    .delete(company, d.reference_id, Some(EntryKind::Income), snapshot, now)?;
            }
            SyncEvent::IncomeInstallmentsCreated(p) => {
                self.sync
                    .create_with_installments(company, EntryKind::Income, p, snapshot, now)?;
            }
            SyncEvent::ExpenseEntryCreated(p) => {
                self.sync.create(company, p.to_draft(EntryKind::Expense), snapshot, now)?;
            }
            SyncEvent::ExpenseEntryUpdated(p) => {
                self.sync.update(company, p.to_draft(EntryKind::Expense), snapshot, now)?;
            }
            SyncEvent::ExpenseEntryDeleted(d) => {
                self.sync
                    .delete(company, d.reference_id, Some(EntryKind::Expense), snapshot, now)?;
            }
            SyncEvent::ExpenseInstallmentsCreated(p) => {
                self.sync
                    .create_with_installments(company, EntryKind::Expense, p, snapshot, now)?;
            }
            SyncEvent::InventoryMovementRecorded(m) => match m.to_draft() {
                Some(draft) => {
                    self.sync.create(company, draft, snapshot, now)?;
                }
                None => debug!(movement_id = %m.movement_id, "unpriced movement, no ledger record"),
            },
            _ => {}
        }
        Ok(())
    }
}

/// Installment payments: flips one installment and re-derives the parent status.
/// Payments for entries that were never synced are ignored.
pub struct InstallmentPaidHandler {
    sync: Arc<FinancialSync>,
}

impl InstallmentPaidHandler {
    pub const NAME: &'static str = "installments";

    pub const EVENTS: [&'static str; 2] = [
        SyncEvent::INCOME_INSTALLMENT_PAID,
        SyncEvent::EXPENSE_INSTALLMENT_PAID,
    ];

    pub fn new(sync: Arc<FinancialSync>) -> Self {
        Self { sync }
    }
}

impl EventHandler<SyncEnvelope> for InstallmentPaidHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn handle(&self, envelope: &SyncEnvelope) -> HandlerResult {
        let (kind, paid) = match envelope.payload() {
            SyncEvent::IncomeInstallmentPaid(p) => (EntryKind::Income, p),
            SyncEvent::ExpenseInstallmentPaid(p) => (EntryKind::Expense, p),
            _ => return Ok(()),
        };
        self.sync.mark_installment_paid(
            envelope.company_id(),
            paid.entry_id,
            kind,
            paid.sequence,
            paid.paid_date,
            envelope.occurred_at(),
        )?;
        Ok(())
    }
}

/// Calendar entries for payments and employee disbursements.
pub struct CalendarHandler {
    calendar: Arc<CalendarProjector>,
}

impl CalendarHandler {
    pub const NAME: &'static str = "calendar";

    pub const EVENTS: [&'static str; 5] = [
        SyncEvent::PAYMENT_CREATED,
        SyncEvent::PAYMENT_UPDATED,
        SyncEvent::PAYMENT_DELETED,
        SyncEvent::EMPLOYEE_PAYMENT_MADE,
        SyncEvent::EMPLOYEE_PAYMENT_CANCELLED,
    ];

    pub fn new(calendar: Arc<CalendarProjector>) -> Self {
        Self { calendar }
    }
}

impl EventHandler<SyncEnvelope> for CalendarHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn handle(&self, envelope: &SyncEnvelope) -> HandlerResult {
        let company = envelope.company_id();
        match envelope.payload() {
            SyncEvent::PaymentCreated(p) | SyncEvent::PaymentUpdated(p) => {
                self.calendar.upsert_payment(company, p)?;
            }
            SyncEvent::PaymentDeleted(d) => {
                self.calendar.remove(company, d.reference_id)?;
            }
            SyncEvent::EmployeePaymentMade(p) => {
                self.calendar.employee_paid(company, p)?;
            }
            SyncEvent::EmployeePaymentCancelled(c) => {
                self.calendar.employee_cancelled(company, c.disbursement_id)?;
            }
            _ => {}
        }
        Ok(())
    }
}

pub struct StockAlertHandler {
    alerts: Arc<StockAlertProjector>,
}

impl StockAlertHandler {
    pub const NAME: &'static str = "stock_alerts";

    pub fn new(alerts: Arc<StockAlertProjector>) -> Self {
        Self { alerts }
    }
}

impl EventHandler<SyncEnvelope> for StockAlertHandler {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn handle(&self, envelope: &SyncEnvelope) -> HandlerResult {
        if let SyncEvent::InventoryBelowMinimum(p) = envelope.payload() {
            self.alerts
                .raise(envelope.company_id(), p, envelope.occurred_at())?;
        }
        Ok(())
    }
}
