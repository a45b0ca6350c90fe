//! Installment sub-ledger.
//!
//! Materializes one row per installment of a parent record and keeps the
//! parent's settlement status and installment count derived from the stored
//! installment set.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use ledgersync_accounting::{
    validate_installments, EntryKind, FinancialRecord, Installment, InstallmentPlanLine,
    SettlementStatus,
};
use ledgersync_core::{CompanyId, DomainError, ReferenceId};

use crate::projections::ledger::ReferenceLocks;
use crate::read_model::{InstallmentStore, RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum InstallmentError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The plan was stored, but it does not add up.
    #[error("installment plan accepted with warning: {0}")]
    PlanWarning(DomainError),

    #[error("no {kind} record for reference {reference}")]
    MissingParent { reference: ReferenceId, kind: EntryKind },

    #[error("installment #{sequence} not found for reference {reference}")]
    MissingInstallment { reference: ReferenceId, sequence: u32 },
}

/// Result of materializing a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedPlan {
    pub inserted: usize,
    pub status: SettlementStatus,
    /// Set when the plan failed validation but was stored anyway.
    pub warning: Option<DomainError>,
}

pub struct InstallmentProjector {
    records: Arc<dyn RecordStore>,
    installments: Arc<dyn InstallmentStore>,
    locks: Arc<ReferenceLocks>,
}

impl InstallmentProjector {
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

    /// Insert one installment per plan line under `parent`, then re-derive the
    /// parent's status. Rows that already exist are left alone, so a redelivered
    /// event is harmless.
    pub fn materialize(
        &self,
        parent: &FinancialRecord,
        plan: &[InstallmentPlanLine],
        now: DateTime<Utc>,
    ) -> Result<MaterializedPlan, InstallmentError> {
        let company = parent.company_id;
        self.locks.with_lock((company, parent.reference_id), || {
            let warning = validate_installments(parent.amount(), plan).err();
            if let Some(ref w) = warning {
                warn!(reference_id = %parent.reference_id, error = %w, "installment plan does not validate");
            }

            let mut inserted = 0;
            for line in plan {
                match self
                    .installments
                    .insert_installment(company, Installment::from_plan(parent.id, line))
                {
                    Ok(()) => inserted += 1,
                    Err(StoreError::Conflict(_)) => {
                        debug!(reference_id = %parent.reference_id, sequence = line.sequence, "installment already stored");
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            let status = self.recompute_locked(parent.company_id, parent.reference_id, parent.kind, now)?;
            Ok(MaterializedPlan {
                inserted,
                status,
                warning,
            })
        })
    }

    /// Mark one installment paid and re-derive the parent's status from all
    /// sibling rows. Paying an already-paid installment keeps its first paid date.
    pub fn mark_paid(
        &self,
        company: CompanyId,
        reference: ReferenceId,
        kind: EntryKind,
        sequence: u32,
        paid_on: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<SettlementStatus, InstallmentError> {
        self.locks.with_lock((company, reference), || {
            let parent = self
                .records
                .find_by_reference(company, reference, kind)?
                .ok_or(InstallmentError::MissingParent { reference, kind })?;

            let mut installment = self
                .installments
                .installments_for(company, parent.id)?
                .into_iter()
                .find(|i| i.sequence == sequence)
                .ok_or(InstallmentError::MissingInstallment { reference, sequence })?;

            if !installment.paid {
                installment.mark_paid(paid_on);
                self.installments.update_installment(company, installment)?;
            }

            self.recompute_locked(company, reference, kind, now)
        })
    }

    /// Current installments of a parent, ordered by sequence.
    pub fn installments_of(
        &self,
        parent: &FinancialRecord,
    ) -> Result<Vec<Installment>, InstallmentError> {
        Ok(self.installments.installments_for(parent.company_id, parent.id)?)
    }

    fn recompute_locked(
        &self,
        company: CompanyId,
        reference: ReferenceId,
        kind: EntryKind,
        now: DateTime<Utc>,
    ) -> Result<SettlementStatus, InstallmentError> {
        // Re-read the parent: the caller's copy may predate a concurrent update.
        let mut parent = self
            .records
            .find_by_reference(company, reference, kind)?
            .ok_or(InstallmentError::MissingParent { reference, kind })?;
        let siblings = self.installments.installments_for(company, parent.id)?;
        let status = SettlementStatus::derive(&siblings);
        // The parent may have been created by a plain entry event before its
        // plan arrived; the stored rows are what make it installment-bearing.
        let count = Some(siblings.len() as u32).filter(|n| *n > 0);

        if parent.status != status || parent.installment_count != count {
            debug!(reference_id = %reference, from = ?parent.status, to = ?status, installments = siblings.len(), "settlement status changed");
            parent.status = status;
            parent.installment_count = count;
            parent.updated_at = now;
            self.records.update(parent)?;
        }
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgersync_accounting::{RecordDetails, RecordDraft, RecordSource};
    use ledgersync_core::Money;

    use crate::locks::KeyedLocks;
    use crate::read_model::{InMemoryInstallmentStore, InMemoryRecordStore};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn money(value: f64) -> Money {
        Money::from_decimal(value).unwrap()
    }

    fn setup(amount: f64, count: Option<u32>) -> (InstallmentProjector, Arc<InMemoryRecordStore>, FinancialRecord) {
        let records = Arc::new(InMemoryRecordStore::new());
        let installments = Arc::new(InMemoryInstallmentStore::new());
        let parent = FinancialRecord::from_draft(
            CompanyId::new(),
            RecordDraft {
                reference_id: ReferenceId::new(),
                kind: EntryKind::Expense,
                source: RecordSource::Entry,
                details: RecordDetails {
                    description: "Laptop".to_string(),
                    date: date(1, 10),
                    amount: money(amount),
                    category: Some("equipment".to_string()),
                    counterparty: None,
                    payment_method: None,
                    document_number: None,
                },
                status: SettlementStatus::Pending,
                installment_count: count,
            },
            Utc::now(),
        );
        records.insert(parent.clone()).unwrap();
        let projector = InstallmentProjector::new(records.clone(), installments, Arc::new(KeyedLocks::new()));
        (projector, records, parent)
    }

    fn plan(amounts: &[f64]) -> Vec<InstallmentPlanLine> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| InstallmentPlanLine {
                sequence: i as u32 + 1,
                amount: money(*amount),
                due_date: date(i as u32 + 1, 28),
                paid: false,
                paid_date: None,
            })
            .collect()
    }

    #[test]
    fn settlement_moves_pending_partial_settled() {
        let (p, _, parent) = setup(300.0, Some(3));
        let out = p.materialize(&parent, &plan(&[100.0, 100.0, 100.0]), Utc::now()).unwrap();
        assert_eq!(out.inserted, 3);
        assert_eq!(out.status, SettlementStatus::Pending);
        assert!(out.warning.is_none());

        let (c, r, k) = (parent.company_id, parent.reference_id, parent.kind);
        assert_eq!(p.mark_paid(c, r, k, 1, date(2, 1), Utc::now()).unwrap(), SettlementStatus::Partial);
        assert_eq!(p.mark_paid(c, r, k, 2, date(3, 1), Utc::now()).unwrap(), SettlementStatus::Partial);
        assert_eq!(p.mark_paid(c, r, k, 3, date(4, 1), Utc::now()).unwrap(), SettlementStatus::Settled);
    }

    #[test]
    fn repeated_payment_keeps_first_paid_date() {
        let (p, _, parent) = setup(200.0, Some(2));
        p.materialize(&parent, &plan(&[100.0, 100.0]), Utc::now()).unwrap();
        let (c, r, k) = (parent.company_id, parent.reference_id, parent.kind);

        p.mark_paid(c, r, k, 1, date(2, 1), Utc::now()).unwrap();
        p.mark_paid(c, r, k, 1, date(5, 1), Utc::now()).unwrap();

        let rows = p.installments_of(&parent).unwrap();
        assert_eq!(rows[0].paid_date, Some(date(2, 1)));
    }

    #[test]
    fn bad_plan_is_stored_with_warning() {
        let (p, _, parent) = setup(300.0, Some(2));
        let out = p.materialize(&parent, &plan(&[100.0, 100.0]), Utc::now()).unwrap();
        assert_eq!(out.inserted, 2);
        assert!(out.warning.is_some());
    }

    #[test]
    fn redelivered_plan_inserts_nothing() {
        let (p, _, parent) = setup(200.0, Some(2));
        p.materialize(&parent, &plan(&[100.0, 100.0]), Utc::now()).unwrap();
        let again = p.materialize(&parent, &plan(&[100.0, 100.0]), Utc::now()).unwrap();
        assert_eq!(again.inserted, 0);
        assert_eq!(p.installments_of(&parent).unwrap().len(), 2);
    }

    #[test]
    fn plan_for_plain_parent_marks_it_installment_bearing() {
        let (p, records, parent) = setup(200.0, None);
        let (c, r, k) = (parent.company_id, parent.reference_id, parent.kind);
        p.materialize(&parent, &plan(&[100.0, 100.0]), Utc::now()).unwrap();

        let stored = records.find_by_reference(c, r, k).unwrap().unwrap();
        assert_eq!(stored.installment_count, Some(2));
        assert!(stored.has_installments());

        p.mark_paid(c, r, k, 1, date(2, 1), Utc::now()).unwrap();
        let partial = records.find_by_reference(c, r, k).unwrap().unwrap();
        assert_eq!(partial.status, SettlementStatus::Partial);
    }

    #[test]
    fn fractional_plan_matches_parent_exactly() {
        let (p, _, parent) = setup(0.3, Some(2));
        let out = p.materialize(&parent, &plan(&[0.1, 0.2]), Utc::now()).unwrap();
        assert!(out.warning.is_none());
    }

    #[test]
    fn unknown_installment_is_reported() {
        let (p, _, parent) = setup(100.0, Some(1));
        p.materialize(&parent, &plan(&[100.0]), Utc::now()).unwrap();
        let err = p
            .mark_paid(parent.company_id, parent.reference_id, parent.kind, 7, date(2, 1), Utc::now())
            .unwrap_err();
        assert!(matches!(err, InstallmentError::MissingInstallment { sequence: 7, .. }));
    }
}
