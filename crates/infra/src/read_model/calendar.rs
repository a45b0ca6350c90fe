use ledgersync_accounting::CalendarEntry;
use ledgersync_core::{CompanyId, ReferenceId};

use super::{CompanyTable, StoreResult};

pub trait CalendarStore: Send + Sync {
    fn find_by_reference(&self, company: CompanyId, reference: ReferenceId) -> StoreResult<Option<CalendarEntry>>;
    fn upsert(&self, entry: CalendarEntry) -> StoreResult<()>;
    fn delete(&self, company: CompanyId, reference: ReferenceId) -> StoreResult<Option<CalendarEntry>>;
    fn list(&self, company: CompanyId) -> StoreResult<Vec<CalendarEntry>>;
}

#[derive(Debug, Default)]
pub struct InMemoryCalendarStore {
    rows: CompanyTable<ReferenceId, CalendarEntry>,
}

impl InMemoryCalendarStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CalendarStore for InMemoryCalendarStore {
    fn find_by_reference(&self, company: CompanyId, reference: ReferenceId) -> StoreResult<Option<CalendarEntry>> {
        self.rows.get(company, &reference)
    }

    fn upsert(&self, entry: CalendarEntry) -> StoreResult<()> {
        self.rows.upsert(entry.company_id, entry.reference_id, entry)?;
        Ok(())
    }

    fn delete(&self, company: CompanyId, reference: ReferenceId) -> StoreResult<Option<CalendarEntry>> {
        self.rows.remove(company, &reference)
    }

    fn list(&self, company: CompanyId) -> StoreResult<Vec<CalendarEntry>> {
        let mut rows = self.rows.list(company)?;
        rows.sort_by_key(|e| e.date);
        Ok(rows)
    }
}
