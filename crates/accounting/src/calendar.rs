use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use ledgersync_core::{CompanyId, Money, ReferenceId};

use crate::record::EntryKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarSource {
    Payment,
    EmployeePayment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarStatus {
    Pending,
    Paid,
    Cancelled,
}

/// Read model: calendar-visible entry, one per payment or disbursement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub company_id: CompanyId,
    pub reference_id: ReferenceId,
    pub source: CalendarSource,
    pub title: String,
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub amount: Money,
    pub status: CalendarStatus,
}
