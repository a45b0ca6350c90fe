//! Ledger projector: one canonical record per `(reference_id, kind)`.
//!
//! - create: insert if absent, otherwise no-op (duplicate delivery)
//! - update: overwrite if present, otherwise insert
//! - delete: stored installments first, then the record; unknown references
//!   are a no-op

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use ledgersync_accounting::{EntryKind, FinancialRecord, RecordDraft};
use ledgersync_core::{CompanyId, ReferenceId};

use crate::locks::KeyedLocks;
use crate::read_model::{InstallmentStore, RecordStore, StoreError, StoreResult};

/// What a ledger write did. Drives the accounting log and monthly totals.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerChange {
    Created(FinancialRecord),
    /// The record already existed; nothing was written.
    Unchanged(FinancialRecord),
    Updated {
        previous: FinancialRecord,
        current: FinancialRecord,
    },
    /// The update changed the record's kind (e.g. a payment flipped direction):
    /// the old record is gone and a new one took its place.
    Replaced {
        removed: FinancialRecord,
        current: FinancialRecord,
    },
}

pub type ReferenceLocks = KeyedLocks<(CompanyId, ReferenceId)>;

pub struct LedgerProjector {
    records: Arc<dyn RecordStore>,
    installments: Arc<dyn InstallmentStore>,
    locks: Arc<ReferenceLocks>,
}

impl LedgerProjector {
    pub fn new(
        records: Arc<dyn RecordStore>,
        installments: Arc<dyn InstallmentStore>,
        locks: Arc<ReferenceLocks>,
    ) -> Self {
        Self {
            records,
            installments,
            locks,
        }
    }

    pub fn find(
        &self,
        company: CompanyId,
        reference: ReferenceId,
        kind: EntryKind,
    ) -> StoreResult<Option<FinancialRecord>> {
        self.records.find_by_reference(company, reference, kind)
    }

    pub fn create(
        &self,
        company: CompanyId,
        draft: RecordDraft,
        now: DateTime<Utc>,
    ) -> StoreResult<LedgerChange> {
        let reference = draft.reference_id;
        self.locks
            .with_lock((company, reference), || self.create_locked(company, draft, now))
    }

    fn create_locked(
        &self,
        company: CompanyId,
        draft: RecordDraft,
        now: DateTime<Utc>,
    ) -> StoreResult<LedgerChange> {
        let (reference, kind) = (draft.reference_id, draft.kind);
        if let Some(existing) = self.records.find_by_reference(company, reference, kind)? {
            debug!(reference_id = %reference, kind = %kind, "ledger record already exists");
            return Ok(LedgerChange::Unchanged(existing));
        }

        let record = FinancialRecord::from_draft(company, draft, now);
        match self.records.insert(record.clone()) {
            Ok(()) => Ok(LedgerChange::Created(record)),
            // Another writer won the unique key between our read and insert.
            Err(StoreError::Conflict(_)) => {
                let existing = self
                    .records
                    .find_by_reference(company, reference, kind)?
                    .ok_or_else(|| StoreError::NotFound(reference.to_string()))?;
                Ok(LedgerChange::Unchanged(existing))
            }
            Err(e) => Err(e),
        }
    }

    pub fn update(
        &self,
        company: CompanyId,
        draft: RecordDraft,
        now: DateTime<Utc>,
    ) -> StoreResult<LedgerChange> {
        let reference = draft.reference_id;
        self.locks.with_lock((company, reference), || {
            let kind = draft.kind;
            if let Some(previous) = self.records.find_by_reference(company, reference, kind)? {
                let mut current = previous.clone();
                current.apply_draft(draft, now);
                self.records.update(current.clone())?;
                return Ok(LedgerChange::Updated { previous, current });
            }

            let other_kind = self
                .records
                .find_any_by_reference(company, reference)?
                .into_iter()
                .find(|r| r.kind != kind);

            match other_kind {
                Some(removed) => {
                    self.remove_record(company, &removed)?;
                    let current = FinancialRecord::from_draft(company, draft, now);
                    self.records.insert(current.clone())?;
                    Ok(LedgerChange::Replaced { removed, current })
                }
                None => self.create_locked(company, draft, now),
            }
        })
    }

    /// Delete the record(s) for a reference. `kind = None` matches any kind
    /// (payment deletions carry only the id). Returns what was removed.
    pub fn delete(
        &self,
        company: CompanyId,
        reference: ReferenceId,
        kind: Option<EntryKind>,
    ) -> StoreResult<Vec<FinancialRecord>> {
        self.locks.with_lock((company, reference), || {
            let targets = match kind {
                Some(kind) => self
                    .records
                    .find_by_reference(company, reference, kind)?
                    .into_iter()
                    .collect(),
                None => self.records.find_any_by_reference(company, reference)?,
            };

            let mut removed = Vec::with_capacity(targets.len());
            for record in targets {
                self.remove_record(company, &record)?;
                removed.push(record);
            }
            Ok(removed)
        })
    }

    fn remove_record(&self, company: CompanyId, record: &FinancialRecord) -> StoreResult<()> {
        // Rows may exist even when the record never saw a planned create.
        let n = self.installments.delete_installments_for(company, record.id)?;
        if n > 0 {
            debug!(reference_id = %record.reference_id, installments = n, "installments removed");
        }
        self.records
            .delete(company, record.reference_id, record.kind)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ledgersync_accounting::{Installment, RecordDetails, RecordSource, SettlementStatus};
    use ledgersync_core::Money;

    use crate::read_model::{InMemoryInstallmentStore, InMemoryRecordStore};

    fn projector() -> (LedgerProjector, Arc<InMemoryRecordStore>, Arc<InMemoryInstallmentStore>) {
        let records = Arc::new(InMemoryRecordStore::new());
        let installments = Arc::new(InMemoryInstallmentStore::new());
        let p = LedgerProjector::new(records.clone(), installments.clone(), Arc::new(KeyedLocks::new()));
        (p, records, installments)
    }

    fn money(value: f64) -> Money {
        Money::from_decimal(value).unwrap()
    }

    fn draft(reference: ReferenceId, kind: EntryKind, amount: f64) -> RecordDraft {
        RecordDraft {
            reference_id: reference,
            kind,
            source: RecordSource::Payment,
            details: RecordDetails {
                description: "Invoice 17".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                amount: money(amount),
                category: None,
                counterparty: Some("ACME".to_string()),
                payment_method: Some("transfer".to_string()),
                document_number: Some("INV-17".to_string()),
            },
            status: SettlementStatus::Pending,
            installment_count: None,
        }
    }

    #[test]
    fn duplicate_create_is_a_no_op() {
        let (p, records, _) = projector();
        let company = CompanyId::new();
        let reference = ReferenceId::new();
        let now = Utc::now();

        let first = p.create(company, draft(reference, EntryKind::Income, 100.0), now).unwrap();
        let second = p.create(company, draft(reference, EntryKind::Income, 999.0), now).unwrap();

        assert!(matches!(first, LedgerChange::Created(_)));
        match second {
            LedgerChange::Unchanged(r) => assert_eq!(r.amount(), money(100.0)),
            other => panic!("expected Unchanged, got {other:?}"),
        }
        assert_eq!(records.find_any_by_reference(company, reference).unwrap().len(), 1);
    }

    #[test]
    fn update_of_unknown_reference_creates() {
        let (p, _, _) = projector();
        let change = p
            .update(CompanyId::new(), draft(ReferenceId::new(), EntryKind::Expense, 40.0), Utc::now())
            .unwrap();
        assert!(matches!(change, LedgerChange::Created(_)));
    }

    #[test]
    fn update_reports_previous_amount() {
        let (p, _, _) = projector();
        let company = CompanyId::new();
        let reference = ReferenceId::new();
        p.create(company, draft(reference, EntryKind::Income, 100.0), Utc::now()).unwrap();

        match p.update(company, draft(reference, EntryKind::Income, 150.0), Utc::now()).unwrap() {
            LedgerChange::Updated { previous, current } => {
                assert_eq!(previous.amount(), money(100.0));
                assert_eq!(current.amount(), money(150.0));
                assert_eq!(previous.id, current.id);
            }
            other => panic!("expected Updated, got {other:?}"),
        }
    }

    #[test]
    fn direction_flip_replaces_the_record() {
        let (p, records, _) = projector();
        let company = CompanyId::new();
        let reference = ReferenceId::new();
        p.create(company, draft(reference, EntryKind::Income, 100.0), Utc::now()).unwrap();

        let change = p.update(company, draft(reference, EntryKind::Expense, 100.0), Utc::now()).unwrap();
        assert!(matches!(change, LedgerChange::Replaced { .. }));

        let left = records.find_any_by_reference(company, reference).unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].kind, EntryKind::Expense);
    }

    #[test]
    fn delete_cascades_to_installments() {
        let (p, records, installments) = projector();
        let company = CompanyId::new();
        let reference = ReferenceId::new();
        let mut d = draft(reference, EntryKind::Expense, 200.0);
        d.installment_count = Some(2);

        let LedgerChange::Created(parent) = p.create(company, d, Utc::now()).unwrap() else {
            panic!("expected Created");
        };
        for sequence in 1..=2 {
            installments
                .insert_installment(
                    company,
                    Installment {
                        parent_id: parent.id,
                        sequence,
                        amount: money(100.0),
                        due_date: NaiveDate::from_ymd_opt(2024, 3 + sequence, 1).unwrap(),
                        paid: false,
                        paid_date: None,
                    },
                )
                .unwrap();
        }

        let removed = p.delete(company, reference, None).unwrap();
        assert_eq!(removed.len(), 1);
        assert!(installments.installments_for(company, parent.id).unwrap().is_empty());
        assert!(records.find_any_by_reference(company, reference).unwrap().is_empty());

        assert!(p.delete(company, reference, None).unwrap().is_empty());
    }

    #[test]
    fn delete_removes_installments_even_without_a_planned_count() {
        let (p, records, installments) = projector();
        let company = CompanyId::new();
        let reference = ReferenceId::new();

        let LedgerChange::Created(parent) = p
            .create(company, draft(reference, EntryKind::Income, 100.0), Utc::now())
            .unwrap()
        else {
            panic!("expected Created");
        };
        assert_eq!(parent.installment_count, None);
        installments
            .insert_installment(
                company,
                Installment {
                    parent_id: parent.id,
                    sequence: 1,
                    amount: money(100.0),
                    due_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
                    paid: false,
                    paid_date: None,
                },
            )
            .unwrap();

        p.delete(company, reference, Some(EntryKind::Income)).unwrap();
        assert!(installments.installments_for(company, parent.id).unwrap().is_empty());
        assert!(records.find_any_by_reference(company, reference).unwrap().is_empty());
    }
}
