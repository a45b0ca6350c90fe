use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use ledgersync_core::{CompanyId, Money, MonthKey, RecordId, ReferenceId};

use crate::installment::Installment;

/// Direction of money for a ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Income => "income",
            EntryKind::Expense => "expense",
        }
    }
}

impl core::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which upstream module a record was projected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    Payment,
    Entry,
    InventoryMovement,
}

/// Settlement status of a record.
///
/// For records with installments this is always derived from the installment
/// set (see `SettlementStatus::derive`); it is never transitioned by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
    #[default]
    Pending,
    Partial,
    Settled,
}

impl SettlementStatus {
    /// `settled` iff every installment is paid, `partial` iff some but not all
    /// are, `pending` otherwise (including the empty set).
    pub fn derive(installments: &[Installment]) -> Self {
        let paid = installments.iter().filter(|i| i.paid).count();
        match paid {
            0 => SettlementStatus::Pending,
            n if n == installments.len() => SettlementStatus::Settled,
            _ => SettlementStatus::Partial,
        }
    }
}

/// Mutable attributes of a record, overwritten wholesale on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDetails {
    pub description: String,
    pub date: NaiveDate,
    pub amount: Money,
    pub category: Option<String>,
    pub counterparty: Option<String>,
    pub payment_method: Option<String>,
    pub document_number: Option<String>,
}

/// Everything a projector needs to create or overwrite a record, extracted from
/// an event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDraft {
    pub reference_id: ReferenceId,
    pub kind: EntryKind,
    pub source: RecordSource,
    pub details: RecordDetails,
    pub status: SettlementStatus,
    pub installment_count: Option<u32>,
}

impl RecordDraft {
    pub fn month(&self) -> MonthKey {
        MonthKey::from_date(self.details.date)
    }
}

/// Read model: canonical ledger record for one upstream domain object.
///
/// At most one record exists per `(company_id, reference_id, kind)`; the store
/// enforces that key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub id: RecordId,
    pub company_id: CompanyId,
    pub reference_id: ReferenceId,
    pub kind: EntryKind,
    pub source: RecordSource,
    pub details: RecordDetails,
    pub status: SettlementStatus,
    pub installment_count: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FinancialRecord {
    pub fn from_draft(company_id: CompanyId, draft: RecordDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::new(),
            company_id,
            reference_id: draft.reference_id,
            kind: draft.kind,
            source: draft.source,
            details: draft.details,
            status: draft.status,
            installment_count: draft.installment_count,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the mutable fields from an update payload.
    ///
    /// Installment-bearing records keep their derived status; the payload's
    /// status only applies to plain records.
    pub fn apply_draft(&mut self, draft: RecordDraft, now: DateTime<Utc>) {
        self.details = draft.details;
        self.source = draft.source;
        if !self.has_installments() {
            self.status = draft.status;
        }
        if draft.installment_count.is_some() {
            self.installment_count = draft.installment_count;
        }
        self.updated_at = now;
    }

    pub fn has_installments(&self) -> bool {
        self.installment_count.is_some_and(|n| n > 0)
    }

    pub fn amount(&self) -> Money {
        self.details.amount
    }

    pub fn month(&self) -> MonthKey {
        MonthKey::from_date(self.details.date)
    }
}
