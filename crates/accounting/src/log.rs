use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use ledgersync_core::{CompanyId, Money, MonthKey, ReferenceId};

use crate::record::EntryKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogAction {
    Create,
    Update,
    Delete,
}

/// Immutable audit entry, appended for every create/update/delete.
///
/// Create/update entries are filed under the month of the record's business
/// date; delete entries under the wall-clock month of the deletion. The latest
/// create/update entry for a reference is what a deletion reverses from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountingLogEntry {
    pub id: Uuid,
    pub company_id: CompanyId,
    pub kind: EntryKind,
    pub action: LogAction,
    pub reference_id: ReferenceId,
    /// Amount at the time of the action.
    pub amount: Money,
    pub month: MonthKey,
    /// Serialized copy of the triggering payload.
    pub snapshot: JsonValue,
    pub recorded_at: DateTime<Utc>,
}

impl AccountingLogEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        company_id: CompanyId,
        kind: EntryKind,
        action: LogAction,
        reference_id: ReferenceId,
        amount: Money,
        month: MonthKey,
        snapshot: JsonValue,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            company_id,
            kind,
            action,
            reference_id,
            amount,
            month,
            snapshot,
            recorded_at,
        }
    }
}
