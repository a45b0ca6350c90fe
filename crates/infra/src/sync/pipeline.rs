use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use ledgersync_accounting::{
    EntryKind, FinancialRecord, InstallmentEntryPayload, LogAction, RecordDraft, SettlementStatus,
};
use ledgersync_core::{CompanyId, Money, ReferenceId};

use crate::projections::{
    AccountingLogProjector, InstallmentError, InstallmentProjector, LedgerChange,
    LedgerProjector, MaterializedPlan, MonthlyAggregateMaintainer,
};

use super::{StepFailure, SyncError, SyncStep};

/// Ledger-driven pipeline shared by every financial event.
///
/// The ledger write comes first; if it fails nothing else runs. The log and
/// aggregate steps then run independently of each other, and their failures are
/// collected into `SyncError::Steps` instead of aborting the sibling step.
pub struct FinancialSync {
    ledger: LedgerProjector,
    installments: InstallmentProjector,
    log: AccountingLogProjector,
    monthly: Arc<MonthlyAggregateMaintainer>,
}

impl FinancialSync {
    pub fn new(
        ledger: LedgerProjector,
        installments: InstallmentProjector,
        log: AccountingLogProjector,
        monthly: Arc<MonthlyAggregateMaintainer>,
    ) -> Self {
        Self {
            ledger,
            installments,
            log,
            monthly,
        }
    }

    pub fn ledger(&self) -> &LedgerProjector {
        &self.ledger
    }

    pub fn log(&self) -> &AccountingLogProjector {
        &self.log
    }

    pub fn installments(&self) -> &InstallmentProjector {
        &self.installments
    }

    /// Creation event: insert the record unless it already exists.
    pub fn create(
        &self,
        company: CompanyId,
        draft: RecordDraft,
        snapshot: JsonValue,
        now: DateTime<Utc>,
    ) -> Result<LedgerChange, SyncError> {
        let change = self.ledger.create(company, draft, now)?;
        let failures = self.follow_up(&change, snapshot, now);
        finish(change, failures)
    }

    /// Update event: overwrite the record, or insert it if it was never seen.
    pub fn update(
        &self,
        company: CompanyId,
        draft: RecordDraft,
        snapshot: JsonValue,
        now: DateTime<Utc>,
    ) -> Result<LedgerChange, SyncError> {
        let change = self.ledger.update(company, draft, now)?;
        let failures = self.follow_up(&change, snapshot, now);
        finish(change, failures)
    }

    /// Creation event with an installment plan: the parent goes through the
    /// normal create path, then one row per installment is materialized.
    pub fn create_with_installments(
        &self,
        company: CompanyId,
        kind: EntryKind,
        payload: &InstallmentEntryPayload,
        snapshot: JsonValue,
        now: DateTime<Utc>,
    ) -> Result<MaterializedPlan, SyncError> {
        let change = self.ledger.create(company, payload.to_draft(kind), now)?;
        let mut failures = self.follow_up(&change, snapshot, now);

        let parent = match &change {
            LedgerChange::Created(r) | LedgerChange::Unchanged(r) => r,
            LedgerChange::Updated { current, .. } | LedgerChange::Replaced { current, .. } => current,
        };

        let plan = match self
            .installments
            .materialize(parent, &payload.effective_plan(), now)
        {
            Ok(plan) => plan,
            Err(err) => {
                warn!(reference_id = %parent.reference_id, error = %err, "installments not materialized");
                failures.push(StepFailure::new(SyncStep::Installments, err));
                return Err(SyncError::Steps(failures));
            }
        };

        if let Some(warning) = &plan.warning {
            failures.push(StepFailure::new(SyncStep::Installments, warning));
        }
        debug!(reference_id = %parent.reference_id, inserted = plan.inserted, status = ?plan.status, "installments materialized");

        if failures.is_empty() {
            Ok(plan)
        } else {
            Err(SyncError::Steps(failures))
        }
    }

    /// Payment of one installment. Returns `None` when the parent or the
    /// installment was never synced; like other updates to unseen ids that is
    /// not an error.
    pub fn mark_installment_paid(
        &self,
        company: CompanyId,
        reference: ReferenceId,
        kind: EntryKind,
        sequence: u32,
        paid_on: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Option<SettlementStatus>, SyncError> {
        match self
            .installments
            .mark_paid(company, reference, kind, sequence, paid_on, now)
        {
            Ok(status) => {
                info!(reference_id = %reference, sequence, status = ?status, "installment paid");
                Ok(Some(status))
            }
            Err(err @ (InstallmentError::MissingParent { .. } | InstallmentError::MissingInstallment { .. })) => {
                debug!(reference_id = %reference, sequence, reason = %err, "payment for unknown installment ignored");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Deletion event. `kind = None` removes whichever record exists for the
    /// reference. Each removed record is reversed out of the monthly aggregate
    /// from its latest create/update log entry.
    pub fn delete(
        &self,
        company: CompanyId,
        reference: ReferenceId,
        kind: Option<EntryKind>,
        snapshot: JsonValue,
        now: DateTime<Utc>,
    ) -> Result<Vec<FinancialRecord>, SyncError> {
        let removed = self.ledger.delete(company, reference, kind)?;
        if removed.is_empty() {
            debug!(reference_id = %reference, "delete for unknown reference ignored");
            return Ok(removed);
        }

        let mut failures = Vec::new();
        for record in &removed {
            failures.extend(self.reverse(record, snapshot.clone(), now));
        }

        if failures.is_empty() {
            Ok(removed)
        } else {
            Err(SyncError::Steps(failures))
        }
    }

    pub fn monthly(&self) -> &MonthlyAggregateMaintainer {
        &self.monthly
    }

    /// Log + aggregate steps after a ledger write.
    fn follow_up(&self, change: &LedgerChange, snapshot: JsonValue, now: DateTime<Utc>) -> Vec<StepFailure> {
        let mut failures = Vec::new();
        match change {
            LedgerChange::Unchanged(record) => {
                debug!(reference_id = %record.reference_id, "duplicate delivery, nothing to do");
            }
            LedgerChange::Created(record) => {
                if let Err(e) = self.log.record_change(LogAction::Create, record, snapshot, now) {
                    failures.push(StepFailure::new(SyncStep::AccountingLog, e));
                }
                if let Err(e) = self.monthly.on_created(record, now) {
                    failures.push(StepFailure::new(SyncStep::MonthlyAggregate, e));
                }
            }
            LedgerChange::Updated { previous, current } => {
                if let Err(e) = self.log.record_change(LogAction::Update, current, snapshot, now) {
                    failures.push(StepFailure::new(SyncStep::AccountingLog, e));
                }
                if let Err(e) = self.monthly.on_updated(previous, current, now) {
                    failures.push(StepFailure::new(SyncStep::MonthlyAggregate, e));
                }
            }
            LedgerChange::Replaced { removed, current } => {
                let logged = self
                    .log
                    .record_deletion(
                        removed.company_id,
                        removed.kind,
                        removed.reference_id,
                        removed.amount(),
                        snapshot.clone(),
                        now,
                    )
                    .and_then(|_| self.log.record_change(LogAction::Create, current, snapshot, now));
                if let Err(e) = logged {
                    failures.push(StepFailure::new(SyncStep::AccountingLog, e));
                }
                if let Err(e) = self.monthly.on_updated(removed, current, now) {
                    failures.push(StepFailure::new(SyncStep::MonthlyAggregate, e));
                }
            }
        }
        failures
    }

    fn reverse(&self, record: &FinancialRecord, snapshot: JsonValue, now: DateTime<Utc>) -> Vec<StepFailure> {
        let mut failures = Vec::new();
        let (company, reference, kind) = (record.company_id, record.reference_id, record.kind);

        let source = match self.log.reversal_source(company, reference, kind) {
            Ok(source) => source,
            Err(e) => {
                failures.push(StepFailure::new(SyncStep::AccountingLog, e));
                None
            }
        };

        let reversed = match &source {
            Some(entry) => match self.monthly.on_deleted(entry, now) {
                Ok(()) => entry.amount,
                Err(e) => {
                    failures.push(StepFailure::new(SyncStep::MonthlyAggregate, e));
                    Money::ZERO
                }
            },
            None => {
                warn!(reference_id = %reference, kind = %kind, "no log entry to reverse from; monthly aggregate left as is");
                Money::ZERO
            }
        };

        if let Err(e) = self
            .log
            .record_deletion(company, kind, reference, reversed, snapshot, now)
        {
            failures.push(StepFailure::new(SyncStep::AccountingLog, e));
        }
        failures
    }
}

fn finish(change: LedgerChange, failures: Vec<StepFailure>) -> Result<LedgerChange, SyncError> {
    if failures.is_empty() {
        Ok(change)
    } else {
        Err(SyncError::Steps(failures))
    }
}
