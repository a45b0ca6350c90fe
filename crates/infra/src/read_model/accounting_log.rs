use std::sync::RwLock;

use ledgersync_accounting::{AccountingLogEntry, EntryKind, LogAction};
use ledgersync_core::{CompanyId, ReferenceId};

use super::{StoreError, StoreResult};

/// Append-only audit log.
pub trait AccountingLogStore: Send + Sync {
    fn append(&self, entry: AccountingLogEntry) -> StoreResult<()>;

    /// Most recent entry for `(reference, kind)` whose action is in `actions`.
    fn latest_for(
        &self,
        company: CompanyId,
        reference: ReferenceId,
        kind: EntryKind,
        actions: &[LogAction],
    ) -> StoreResult<Option<AccountingLogEntry>>;

    /// Every entry for a company in append order.
    fn list(&self, company: CompanyId) -> StoreResult<Vec<AccountingLogEntry>>;
}

#[derive(Debug, Default)]
pub struct InMemoryAccountingLog {
    entries: RwLock<Vec<AccountingLogEntry>>,
}

impl InMemoryAccountingLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AccountingLogStore for InMemoryAccountingLog {
    fn append(&self, entry: AccountingLogEntry) -> StoreResult<()> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.push(entry);
        Ok(())
    }

    fn latest_for(
        &self,
        company: CompanyId,
        reference: ReferenceId,
        kind: EntryKind,
        actions: &[LogAction],
    ) -> StoreResult<Option<AccountingLogEntry>> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries
            .iter()
            .rev()
            .find(|e| {
                e.company_id == company
                    && e.reference_id == reference
                    && e.kind == kind
                    && actions.contains(&e.action)
            })
            .cloned())
    }

    fn list(&self, company: CompanyId) -> StoreResult<Vec<AccountingLogEntry>> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries
            .iter()
            .filter(|e| e.company_id == company)
            .cloned()
            .collect())
    }
}
