use serde::{Deserialize, Serialize};

use ledgersync_core::{CompanyId, Money, MonthKey, ReferenceId};

use super::{CompanyTable, StoreResult};

/// One employee's payroll summary for a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollSummary {
    pub employee_id: ReferenceId,
    pub month: MonthKey,
    /// Gross salary actually paid out.
    pub real_salary: Money,
}

/// Read-only payroll source consumed by the tax forecast.
pub trait PayrollSource: Send + Sync {
    fn real_salary_total(&self, company: CompanyId, month: MonthKey) -> StoreResult<Money>;
}

#[derive(Debug, Default)]
pub struct InMemoryPayrollSource {
    rows: CompanyTable<(ReferenceId, MonthKey), PayrollSummary>,
}

impl InMemoryPayrollSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, company: CompanyId, summary: PayrollSummary) -> StoreResult<()> {
        self.rows
            .upsert(company, (summary.employee_id, summary.month), summary)?;
        Ok(())
    }
}

impl PayrollSource for InMemoryPayrollSource {
    fn real_salary_total(&self, company: CompanyId, month: MonthKey) -> StoreResult<Money> {
        let rows = self.rows.list_where(company, |(_, m), _| *m == month)?;
        Ok(rows.iter().map(|s| s.real_salary).sum())
    }
}
