//! Event vocabulary published by the upstream modules.
//!
//! One variant per event name; each carries its own typed payload. Deletions
//! carry only the reference id of the deleted object.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ledgersync_core::{Money, ReferenceId};
use ledgersync_events::Event;

use crate::record::{EntryKind, RecordDetails, RecordDraft, RecordSource, SettlementStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentDirection {
    Incoming,
    Outgoing,
}

impl PaymentDirection {
    pub fn kind(&self) -> EntryKind {
        match self {
            PaymentDirection::Incoming => EntryKind::Income,
            PaymentDirection::Outgoing => EntryKind::Expense,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPayload {
    pub payment_id: ReferenceId,
    pub direction: PaymentDirection,
    pub description: String,
    pub date: NaiveDate,
    pub amount: Money,
    pub status: PaymentStatus,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub counterparty: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub document_number: Option<String>,
}

impl PaymentPayload {
    pub fn to_draft(&self) -> RecordDraft {
        RecordDraft {
            reference_id: self.payment_id,
            kind: self.direction.kind(),
            source: RecordSource::Payment,
            details: RecordDetails {
                description: self.description.clone(),
                date: self.date,
                amount: self.amount,
                category: self.category.clone(),
                counterparty: self.counterparty.clone(),
                payment_method: self.payment_method.clone(),
                document_number: self.document_number.clone(),
            },
            status: match self.status {
                PaymentStatus::Pending => SettlementStatus::Pending,
                PaymentStatus::Paid => SettlementStatus::Settled,
            },
            installment_count: None,
        }
    }
}

/// Payload of an income or expense entry; the kind comes from the event variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPayload {
    pub entry_id: ReferenceId,
    pub description: String,
    pub date: NaiveDate,
    pub amount: Money,
    #[serde(default)]
    pub status: SettlementStatus,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub counterparty: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub document_number: Option<String>,
}

impl EntryPayload {
    pub fn to_draft(&self, kind: EntryKind) -> RecordDraft {
        RecordDraft {
            reference_id: self.entry_id,
            kind,
            source: RecordSource::Entry,
            details: RecordDetails {
                description: self.description.clone(),
                date: self.date,
                amount: self.amount,
                category: self.category.clone(),
                counterparty: self.counterparty.clone(),
                payment_method: self.payment_method.clone(),
                document_number: self.document_number.clone(),
            },
            status: self.status,
            installment_count: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentPlanLine {
    pub sequence: u32,
    pub amount: Money,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
}

/// An income/expense entry created together with its installment plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentEntryPayload {
    pub entry: EntryPayload,
    pub installments: Vec<InstallmentPlanLine>,
}

impl InstallmentEntryPayload {
    pub fn to_draft(&self, kind: EntryKind) -> RecordDraft {
        let mut draft = self.entry.to_draft(kind);
        draft.installment_count = Some(self.installments.len() as u32);
        draft
    }

    /// The plan as it should be stored.
    ///
    /// An entry that was already settled when created has its first installment
    /// pre-marked paid on the entry date.
    pub fn effective_plan(&self) -> Vec<InstallmentPlanLine> {
        let mut plan = self.installments.clone();
        if self.entry.status == SettlementStatus::Settled {
            if let Some(first) = plan.iter_mut().find(|l| l.sequence == 1) {
                if !first.paid {
                    first.paid = true;
                    first.paid_date = Some(self.entry.date);
                }
            }
        }
        plan
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentPaidPayload {
    /// Reference of the parent entry.
    pub entry_id: ReferenceId,
    pub sequence: u32,
    pub paid_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDeleted {
    pub reference_id: ReferenceId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeePaymentPayload {
    pub disbursement_id: ReferenceId,
    pub employee_name: String,
    pub date: NaiveDate,
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeePaymentCancelled {
    pub disbursement_id: ReferenceId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    In,
    Out,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryMovementPayload {
    pub movement_id: ReferenceId,
    pub item_id: ReferenceId,
    pub item_name: String,
    pub direction: MovementDirection,
    pub quantity: f64,
    /// Movements without a price (transfers, corrections) carry no money.
    #[serde(default)]
    pub unit_price: Option<Money>,
    pub date: NaiveDate,
}

impl InventoryMovementPayload {
    /// Ledger draft for priced movements: stock in is a purchase, stock out a sale.
    pub fn to_draft(&self) -> Option<RecordDraft> {
        let unit_price = self.unit_price?;
        let (kind, verb) = match self.direction {
            MovementDirection::In => (EntryKind::Expense, "Inventory purchase"),
            MovementDirection::Out => (EntryKind::Income, "Inventory sale"),
        };
        Some(RecordDraft {
            reference_id: self.movement_id,
            kind,
            source: RecordSource::InventoryMovement,
            details: RecordDetails {
                description: format!("{verb}: {}", self.item_name),
                date: self.date,
                amount: unit_price.scale(self.quantity.abs()),
                category: Some("inventory".to_string()),
                counterparty: None,
                payment_method: None,
                document_number: None,
            },
            status: SettlementStatus::Settled,
            installment_count: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryBelowMinimumPayload {
    pub item_id: ReferenceId,
    pub item_name: String,
    pub current_quantity: f64,
    pub minimum_quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SyncEvent {
    PaymentCreated(PaymentPayload),
    PaymentUpdated(PaymentPayload),
    PaymentDeleted(ReferenceDeleted),

    IncomeEntryCreated(EntryPayload),
    IncomeEntryUpdated(EntryPayload),
    IncomeEntryDeleted(ReferenceDeleted),
    IncomeInstallmentsCreated(InstallmentEntryPayload),
    IncomeInstallmentPaid(InstallmentPaidPayload),

    ExpenseEntryCreated(EntryPayload),
    ExpenseEntryUpdated(EntryPayload),
    ExpenseEntryDeleted(ReferenceDeleted),
    ExpenseInstallmentsCreated(InstallmentEntryPayload),
    ExpenseInstallmentPaid(InstallmentPaidPayload),

    EmployeePaymentMade(EmployeePaymentPayload),
    EmployeePaymentCancelled(EmployeePaymentCancelled),

    InventoryMovementRecorded(InventoryMovementPayload),
    InventoryBelowMinimum(InventoryBelowMinimumPayload),
}

impl SyncEvent {
    pub const PAYMENT_CREATED: &'static str = "payment.created";
    pub const PAYMENT_UPDATED: &'static str = "payment.updated";
    pub const PAYMENT_DELETED: &'static str = "payment.deleted";
    pub const INCOME_ENTRY_CREATED: &'static str = "income_entry.created";
    pub const INCOME_ENTRY_UPDATED: &'static str = "income_entry.updated";
    pub const INCOME_ENTRY_DELETED: &'static str = "income_entry.deleted";
    pub const INCOME_INSTALLMENTS_CREATED: &'static str = "income_entry.installments_created";
    pub const INCOME_INSTALLMENT_PAID: &'static str = "income_entry.installment_paid";
    pub const EXPENSE_ENTRY_CREATED: &'static str = "expense_entry.created";
    pub const EXPENSE_ENTRY_UPDATED: &'static str = "expense_entry.updated";
    pub const EXPENSE_ENTRY_DELETED: &'static str = "expense_entry.deleted";
    pub const EXPENSE_INSTALLMENTS_CREATED: &'static str = "expense_entry.installments_created";
    pub const EXPENSE_INSTALLMENT_PAID: &'static str = "expense_entry.installment_paid";
    pub const EMPLOYEE_PAYMENT_MADE: &'static str = "employee_payment.made";
    pub const EMPLOYEE_PAYMENT_CANCELLED: &'static str = "employee_payment.cancelled";
    pub const INVENTORY_MOVEMENT_RECORDED: &'static str = "inventory.movement_recorded";
    pub const INVENTORY_BELOW_MINIMUM: &'static str = "inventory.below_minimum";

    /// Every event name in the vocabulary.
    pub const ALL: [&'static str; 17] = [
        Self::PAYMENT_CREATED,
        Self::PAYMENT_UPDATED,
        Self::PAYMENT_DELETED,
        Self::INCOME_ENTRY_CREATED,
        Self::INCOME_ENTRY_UPDATED,
        Self::INCOME_ENTRY_DELETED,
        Self::INCOME_INSTALLMENTS_CREATED,
        Self::INCOME_INSTALLMENT_PAID,
        Self::EXPENSE_ENTRY_CREATED,
        Self::EXPENSE_ENTRY_UPDATED,
        Self::EXPENSE_ENTRY_DELETED,
        Self::EXPENSE_INSTALLMENTS_CREATED,
        Self::EXPENSE_INSTALLMENT_PAID,
        Self::EMPLOYEE_PAYMENT_MADE,
        Self::EMPLOYEE_PAYMENT_CANCELLED,
        Self::INVENTORY_MOVEMENT_RECORDED,
        Self::INVENTORY_BELOW_MINIMUM,
    ];

    /// Reference id of the upstream object the event is about.
    pub fn reference_id(&self) -> ReferenceId {
        match self {
            SyncEvent::PaymentCreated(p) | SyncEvent::PaymentUpdated(p) => p.payment_id,
            SyncEvent::IncomeEntryCreated(p)
            | SyncEvent::IncomeEntryUpdated(p)
            | SyncEvent::ExpenseEntryCreated(p)
            | SyncEvent::ExpenseEntryUpdated(p) => p.entry_id,
            SyncEvent::IncomeInstallmentsCreated(p) | SyncEvent::ExpenseInstallmentsCreated(p) => {
                p.entry.entry_id
            }
            SyncEvent::IncomeInstallmentPaid(p) | SyncEvent::ExpenseInstallmentPaid(p) => {
                p.entry_id
            }
            SyncEvent::PaymentDeleted(d)
            | SyncEvent::IncomeEntryDeleted(d)
            | SyncEvent::ExpenseEntryDeleted(d) => d.reference_id,
            SyncEvent::EmployeePaymentMade(p) => p.disbursement_id,
            SyncEvent::EmployeePaymentCancelled(p) => p.disbursement_id,
            SyncEvent::InventoryMovementRecorded(p) => p.movement_id,
            SyncEvent::InventoryBelowMinimum(p) => p.item_id,
        }
    }
}

impl Event for SyncEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SyncEvent::PaymentCreated(_) => Self::PAYMENT_CREATED,
            SyncEvent::PaymentUpdated(_) => Self::PAYMENT_UPDATED,
            SyncEvent::PaymentDeleted(_) => Self::PAYMENT_DELETED,
            SyncEvent::IncomeEntryCreated(_) => Self::INCOME_ENTRY_CREATED,
            SyncEvent::IncomeEntryUpdated(_) => Self::INCOME_ENTRY_UPDATED,
            SyncEvent::IncomeEntryDeleted(_) => Self::INCOME_ENTRY_DELETED,
            SyncEvent::IncomeInstallmentsCreated(_) => Self::INCOME_INSTALLMENTS_CREATED,
            SyncEvent::IncomeInstallmentPaid(_) => Self::INCOME_INSTALLMENT_PAID,
            SyncEvent::ExpenseEntryCreated(_) => Self::EXPENSE_ENTRY_CREATED,
            SyncEvent::ExpenseEntryUpdated(_) => Self::EXPENSE_ENTRY_UPDATED,
            SyncEvent::ExpenseEntryDeleted(_) => Self::EXPENSE_ENTRY_DELETED,
            SyncEvent::ExpenseInstallmentsCreated(_) => Self::EXPENSE_INSTALLMENTS_CREATED,
            SyncEvent::ExpenseInstallmentPaid(_) => Self::EXPENSE_INSTALLMENT_PAID,
            SyncEvent::EmployeePaymentMade(_) => Self::EMPLOYEE_PAYMENT_MADE,
            SyncEvent::EmployeePaymentCancelled(_) => Self::EMPLOYEE_PAYMENT_CANCELLED,
            SyncEvent::InventoryMovementRecorded(_) => Self::INVENTORY_MOVEMENT_RECORDED,
            SyncEvent::InventoryBelowMinimum(_) => Self::INVENTORY_BELOW_MINIMUM,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(status: SettlementStatus) -> EntryPayload {
        EntryPayload {
            entry_id: ReferenceId::new(),
            description: "Laptop".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
            amount: Money::from_cents(120_000),
            status,
            category: None,
            counterparty: None,
            payment_method: None,
            document_number: None,
        }
    }

    fn plan() -> Vec<InstallmentPlanLine> {
        (1..=3)
            .map(|sequence| InstallmentPlanLine {
                sequence,
                amount: Money::from_cents(40_000),
                due_date: NaiveDate::from_ymd_opt(2024, 2 + sequence, 10).unwrap(),
                paid: false,
                paid_date: None,
            })
            .collect()
    }

    #[test]
    fn every_variant_has_a_name_in_the_vocabulary() {
        let ev = SyncEvent::ExpenseEntryDeleted(ReferenceDeleted {
            reference_id: ReferenceId::new(),
        });
        assert!(SyncEvent::ALL.contains(&ev.event_type()));

        let mut names = SyncEvent::ALL.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), SyncEvent::ALL.len());
    }

    #[test]
    fn settled_entry_pre_marks_first_installment() {
        let payload = InstallmentEntryPayload {
            entry: entry(SettlementStatus::Settled),
            installments: plan(),
        };
        let effective = payload.effective_plan();
        assert!(effective[0].paid);
        assert_eq!(effective[0].paid_date, Some(payload.entry.date));
        assert!(!effective[1].paid);
        assert_eq!(payload.to_draft(EntryKind::Expense).installment_count, Some(3));
    }

    #[test]
    fn pending_entry_keeps_plan_as_given() {
        let payload = InstallmentEntryPayload {
            entry: entry(SettlementStatus::Pending),
            installments: plan(),
        };
        assert!(payload.effective_plan().iter().all(|l| !l.paid));
    }

    #[test]
    fn unpriced_movement_has_no_ledger_draft() {
        let mut movement = InventoryMovementPayload {
            movement_id: ReferenceId::new(),
            item_id: ReferenceId::new(),
            item_name: "Widget".to_string(),
            direction: MovementDirection::Out,
            quantity: -4.0,
            unit_price: None,
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        };
        assert!(movement.to_draft().is_none());

        movement.unit_price = Some(Money::from_cents(250));
        let draft = movement.to_draft().unwrap();
        assert_eq!(draft.kind, EntryKind::Income);
        assert_eq!(draft.details.amount, Money::from_cents(1_000));
    }

    #[test]
    fn wire_format_is_tagged_by_variant() {
        let ev = SyncEvent::PaymentDeleted(ReferenceDeleted {
            reference_id: ReferenceId::new(),
        });
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "payment_deleted");
        assert!(json["payload"]["reference_id"].is_string());
    }
}
