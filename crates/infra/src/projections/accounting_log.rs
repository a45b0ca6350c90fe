//! Accounting log projector (append-only audit trail).
//!
//! Create/update entries are filed under the record's business month; delete
//! entries under the month the deletion happened in. Deletions reverse the
//! monthly aggregate from the latest create/update entry, never from the live
//! record (which is gone by then).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use ledgersync_accounting::{AccountingLogEntry, EntryKind, FinancialRecord, LogAction};
use ledgersync_core::{CompanyId, Money, MonthKey, ReferenceId};

use crate::read_model::{AccountingLogStore, StoreResult};

const REVERSIBLE: [LogAction; 2] = [LogAction::Create, LogAction::Update];

pub struct AccountingLogProjector {
    log: Arc<dyn AccountingLogStore>,
}

impl AccountingLogProjector {
    pub fn new(log: Arc<dyn AccountingLogStore>) -> Self {
        Self { log }
    }

    /// Append a create/update entry for `record` as it now stands.
    pub fn record_change(
        &self,
        action: LogAction,
        record: &FinancialRecord,
        snapshot: JsonValue,
        now: DateTime<Utc>,
    ) -> StoreResult<AccountingLogEntry> {
        let entry = AccountingLogEntry::new(
            record.company_id,
            record.kind,
            action,
            record.reference_id,
            record.amount(),
            record.month(),
            snapshot,
            now,
        );
        self.log.append(entry.clone())?;
        Ok(entry)
    }

    /// Append a delete entry. `amount` is what was reversed.
    pub fn record_deletion(
        &self,
        company: CompanyId,
        kind: EntryKind,
        reference: ReferenceId,
        amount: Money,
        snapshot: JsonValue,
        now: DateTime<Utc>,
    ) -> StoreResult<AccountingLogEntry> {
        let entry = AccountingLogEntry::new(
            company,
            kind,
            LogAction::Delete,
            reference,
            amount,
            MonthKey::from_datetime(now),
            snapshot,
            now,
        );
        self.log.append(entry.clone())?;
        Ok(entry)
    }

    /// The entry whose amount and month are currently held in the monthly
    /// aggregate for `(reference, kind)`.
    pub fn reversal_source(
        &self,
        company: CompanyId,
        reference: ReferenceId,
        kind: EntryKind,
    ) -> StoreResult<Option<AccountingLogEntry>> {
        self.log.latest_for(company, reference, kind, &REVERSIBLE)
    }

    pub fn entries(&self, company: CompanyId) -> StoreResult<Vec<AccountingLogEntry>> {
        self.log.list(company)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use ledgersync_accounting::{RecordDetails, RecordDraft, RecordSource, SettlementStatus};
    use serde_json::json;

    use crate::read_model::InMemoryAccountingLog;

    fn record(company: CompanyId, reference: ReferenceId, cents: i64, month: u32) -> FinancialRecord {
        FinancialRecord::from_draft(
            company,
            RecordDraft {
                reference_id: reference,
                kind: EntryKind::Income,
                source: RecordSource::Entry,
                details: RecordDetails {
                    description: "Consulting".to_string(),
                    date: NaiveDate::from_ymd_opt(2024, month, 15).unwrap(),
                    amount: Money::from_cents(cents),
                    category: None,
                    counterparty: None,
                    payment_method: None,
                    document_number: None,
                },
                status: SettlementStatus::Settled,
                installment_count: None,
            },
            Utc::now(),
        )
    }

    #[test]
    fn change_entries_use_business_month_and_deletes_use_wall_clock() {
        let projector = AccountingLogProjector::new(Arc::new(InMemoryAccountingLog::new()));
        let company = CompanyId::new();
        let reference = ReferenceId::new();
        let now = Utc.with_ymd_and_hms(2024, 9, 2, 8, 0, 0).unwrap();

        let created = projector
            .record_change(LogAction::Create, &record(company, reference, 10_000, 3), json!({}), now)
            .unwrap();
        let deleted = projector
            .record_deletion(company, EntryKind::Income, reference, Money::from_cents(10_000), json!({}), now)
            .unwrap();

        assert_eq!(created.month.to_string(), "2024-03");
        assert_eq!(deleted.month.to_string(), "2024-09");
    }

    #[test]
    fn reversal_source_is_the_latest_change() {
        let projector = AccountingLogProjector::new(Arc::new(InMemoryAccountingLog::new()));
        let company = CompanyId::new();
        let reference = ReferenceId::new();
        let now = Utc::now();

        projector
            .record_change(LogAction::Create, &record(company, reference, 10_000, 3), json!({}), now)
            .unwrap();
        projector
            .record_change(LogAction::Update, &record(company, reference, 15_000, 4), json!({}), now)
            .unwrap();

        let source = projector
            .reversal_source(company, reference, EntryKind::Income)
            .unwrap()
            .unwrap();
        assert_eq!(source.amount, Money::from_cents(15_000));
        assert_eq!(source.month.to_string(), "2024-04");

        assert!(projector
            .reversal_source(company, reference, EntryKind::Expense)
            .unwrap()
            .is_none());
        assert_eq!(projector.entries(company).unwrap().len(), 2);
    }
}
