//! Calendar projector: one entry per payment or employee disbursement.

use std::sync::Arc;

use tracing::debug;

use ledgersync_accounting::{
    CalendarEntry, CalendarSource, CalendarStatus, EmployeePaymentPayload, EntryKind,
    PaymentPayload, PaymentStatus,
};
use ledgersync_core::{CompanyId, ReferenceId};

use crate::read_model::{CalendarStore, StoreResult};

pub struct CalendarProjector {
    store: Arc<dyn CalendarStore>,
}

impl CalendarProjector {
    pub fn new(store: Arc<dyn CalendarStore>) -> Self {
        Self { store }
    }

    /// Create or overwrite the entry for a payment.
    pub fn upsert_payment(&self, company: CompanyId, payment: &PaymentPayload) -> StoreResult<CalendarEntry> {
        let entry = CalendarEntry {
            company_id: company,
            reference_id: payment.payment_id,
            source: CalendarSource::Payment,
            title: payment.description.clone(),
            date: payment.date,
            kind: payment.direction.kind(),
            amount: payment.amount,
            status: match payment.status {
                PaymentStatus::Pending => CalendarStatus::Pending,
                PaymentStatus::Paid => CalendarStatus::Paid,
            },
        };
        self.store.upsert(entry.clone())?;
        Ok(entry)
    }

    pub fn employee_paid(
        &self,
        company: CompanyId,
        payment: &EmployeePaymentPayload,
    ) -> StoreResult<CalendarEntry> {
        let entry = CalendarEntry {
            company_id: company,
            reference_id: payment.disbursement_id,
            source: CalendarSource::EmployeePayment,
            title: format!("Salary: {}", payment.employee_name),
            date: payment.date,
            kind: EntryKind::Expense,
            amount: payment.amount,
            status: CalendarStatus::Paid,
        };
        self.store.upsert(entry.clone())?;
        Ok(entry)
    }

    /// Flag a disbursement's entry as cancelled. Unknown ids are a no-op.
    pub fn employee_cancelled(
        &self,
        company: CompanyId,
        disbursement: ReferenceId,
    ) -> StoreResult<Option<CalendarEntry>> {
        let Some(mut entry) = self.store.find_by_reference(company, disbursement)? else {
            debug!(reference_id = %disbursement, "no calendar entry to cancel");
            return Ok(None);
        };
        entry.status = CalendarStatus::Cancelled;
        self.store.upsert(entry.clone())?;
        Ok(Some(entry))
    }

    pub fn remove(&self, company: CompanyId, reference: ReferenceId) -> StoreResult<Option<CalendarEntry>> {
        self.store.delete(company, reference)
    }

    pub fn entries(&self, company: CompanyId) -> StoreResult<Vec<CalendarEntry>> {
        self.store.list(company)
    }
}
