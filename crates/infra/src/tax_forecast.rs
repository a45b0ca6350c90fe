//! Tax forecast engine.
//!
//! Reads the ledger and payroll for one company-month, runs the four tax
//! computations, and appends a forecast snapshot. Independent of the dispatcher.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, info};

use ledgersync_accounting::EntryKind;
use ledgersync_core::{CompanyId, DomainError, Money, MonthKey};
use ledgersync_tax::{MonthlyTotals, TaxFigures, TaxForecast, compute_all};

use crate::config::{ConfigError, SyncConfig, TaxProfileSource};
use crate::read_model::{ForecastStore, PayrollSource, RecordStore, StoreError};

#[derive(Debug, Error)]
pub enum TaxError {
    #[error("tax configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid tax profile: {0}")]
    InvalidProfile(DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct TaxForecastEngine {
    records: Arc<dyn RecordStore>,
    payroll: Arc<dyn PayrollSource>,
    profiles: Arc<dyn TaxProfileSource>,
    forecasts: Arc<dyn ForecastStore>,
    ttl: Duration,
}

impl TaxForecastEngine {
    pub fn new(
        records: Arc<dyn RecordStore>,
        payroll: Arc<dyn PayrollSource>,
        profiles: Arc<dyn TaxProfileSource>,
        forecasts: Arc<dyn ForecastStore>,
    ) -> Self {
        Self {
            records,
            payroll,
            profiles,
            forecasts,
            ttl: SyncConfig::default().forecast_ttl,
        }
    }

    pub fn with_config(mut self, config: &SyncConfig) -> Self {
        self.ttl = config.forecast_ttl;
        self
    }

    /// Income and expense sums over the ledger records dated in `month`.
    ///
    /// Summed in cents; the tax computations take decimal amounts.
    pub fn monthly_totals(&self, company: CompanyId, month: MonthKey) -> Result<MonthlyTotals, TaxError> {
        let (income, expense) = self
            .records
            .list_for_month(company, month)?
            .iter()
            .fold((Money::ZERO, Money::ZERO), |(income, expense), r| match r.kind {
                EntryKind::Income => (income + r.amount(), expense),
                EntryKind::Expense => (income, expense + r.amount()),
            });
        Ok(MonthlyTotals {
            income: income.to_f64(),
            expense: expense.to_f64(),
        })
    }

    /// Run the four computations without persisting anything.
    pub fn compute(&self, company: CompanyId, month: MonthKey) -> Result<TaxFigures, TaxError> {
        let profile = self.profiles.profile(company)?;
        profile.validate().map_err(TaxError::InvalidProfile)?;

        let totals = self.monthly_totals(company, month)?;
        let salaries = self.payroll.real_salary_total(company, month)?;
        Ok(compute_all(&profile, totals, salaries.to_f64()))
    }

    pub fn generate_forecast(&self, company: CompanyId, month: MonthKey) -> Result<TaxForecast, TaxError> {
        self.generate_forecast_at(company, month, Utc::now())
    }

    /// Compute and append a new forecast row stamped `now`.
    pub fn generate_forecast_at(
        &self,
        company: CompanyId,
        month: MonthKey,
        now: DateTime<Utc>,
    ) -> Result<TaxForecast, TaxError> {
        let figures = self.compute(company, month)?;
        let forecast = TaxForecast::from_figures(company, month, &figures, now);
        self.forecasts.insert(forecast.clone())?;
        info!(
            company_id = %company,
            month = %month,
            vat = forecast.vat_payable,
            trade_tax = forecast.trade_tax,
            corp_tax = forecast.corp_tax,
            payroll_tax = forecast.payroll_tax,
            "tax forecast generated"
        );
        Ok(forecast)
    }

    /// The latest stored forecast if it is still fresh, otherwise a new one.
    pub fn forecast(
        &self,
        company: CompanyId,
        month: MonthKey,
        now: DateTime<Utc>,
    ) -> Result<TaxForecast, TaxError> {
        if let Some(cached) = self.forecasts.latest(company, month)? {
            if cached.is_fresh(now, self.ttl) {
                debug!(company_id = %company, month = %month, "reusing cached tax forecast");
                return Ok(cached);
            }
        }
        self.generate_forecast_at(company, month, now)
    }

    pub fn history(&self, company: CompanyId, month: MonthKey) -> Result<Vec<TaxForecast>, TaxError> {
        Ok(self.forecasts.history(company, month)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ledgersync_accounting::{
        FinancialRecord, RecordDetails, RecordDraft, RecordSource, SettlementStatus,
    };
    use ledgersync_core::ReferenceId;
    use ledgersync_tax::{CompanyType, TaxProfile};

    use crate::config::StaticTaxProfiles;
    use crate::read_model::{
        InMemoryForecastStore, InMemoryPayrollSource, InMemoryRecordStore, PayrollSummary,
    };

    fn profile(company_type: CompanyType) -> TaxProfile {
        TaxProfile {
            company_type,
            small_business: false,
            vat_rate: 19.0,
            trade_tax_multiplier: 14.0,
            corp_tax_rate: 15.0,
            solidarity_rate: 5.5,
            payroll_base_rate: 20.0,
        }
    }

    fn money(value: f64) -> Money {
        Money::from_decimal(value).unwrap()
    }

    fn record(company: CompanyId, kind: EntryKind, amount: f64, day: u32) -> FinancialRecord {
        FinancialRecord::from_draft(
            company,
            RecordDraft {
                reference_id: ReferenceId::new(),
                kind,
                source: RecordSource::Entry,
                details: RecordDetails {
                    description: "x".to_string(),
                    date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
                    amount: money(amount),
                    category: None,
                    counterparty: None,
                    payment_method: None,
                    document_number: None,
                },
                status: SettlementStatus::Settled,
                installment_count: None,
            },
            Utc::now(),
        )
    }

    struct Fixture {
        engine: TaxForecastEngine,
        records: Arc<InMemoryRecordStore>,
        payroll: Arc<InMemoryPayrollSource>,
        profiles: Arc<StaticTaxProfiles>,
    }

    fn fixture() -> Fixture {
        let records = Arc::new(InMemoryRecordStore::new());
        let payroll = Arc::new(InMemoryPayrollSource::new());
        let profiles = Arc::new(StaticTaxProfiles::new());
        let engine = TaxForecastEngine::new(
            records.clone(),
            payroll.clone(),
            profiles.clone(),
            Arc::new(InMemoryForecastStore::new()),
        );
        Fixture {
            engine,
            records,
            payroll,
            profiles,
        }
    }

    fn may() -> MonthKey {
        MonthKey::new(2024, 5).unwrap()
    }

    #[test]
    fn forecast_covers_all_four_taxes() {
        let f = fixture();
        let company = CompanyId::new();
        f.profiles.set(company, profile(CompanyType::Gmbh));
        f.records.insert(record(company, EntryKind::Income, 10_000.0, 3)).unwrap();
        f.records.insert(record(company, EntryKind::Expense, 2_000.0, 9)).unwrap();
        f.payroll
            .record(
                company,
                PayrollSummary {
                    employee_id: ReferenceId::new(),
                    month: may(),
                    real_salary: money(3_000.0),
                },
            )
            .unwrap();

        let forecast = f.engine.generate_forecast(company, may()).unwrap();
        assert!((forecast.vat_payable - 1_580.67).abs() < 0.05);
        assert!((forecast.trade_tax - 1_120.0).abs() < 0.01);
        assert!((forecast.corp_tax - 1_266.0).abs() < 0.01);
        assert!((forecast.payroll_tax - 600.0).abs() < 0.01);
    }

    #[test]
    fn fractional_amounts_sum_exactly() {
        let f = fixture();
        let company = CompanyId::new();
        f.records.insert(record(company, EntryKind::Income, 0.1, 2)).unwrap();
        f.records.insert(record(company, EntryKind::Income, 0.2, 3)).unwrap();

        let totals = f.engine.monthly_totals(company, may()).unwrap();
        assert_eq!(totals.income, 0.3);
    }

    #[test]
    fn missing_profile_is_a_config_error() {
        let f = fixture();
        let err = f.engine.generate_forecast(CompanyId::new(), may()).unwrap_err();
        assert!(matches!(err, TaxError::Config(ConfigError::MissingProfile(_))));
    }

    #[test]
    fn fresh_forecast_is_reused_and_stale_one_regenerated() {
        let f = fixture();
        let company = CompanyId::new();
        f.profiles.set(company, profile(CompanyType::Freelancer));
        f.records.insert(record(company, EntryKind::Income, 1_000.0, 1)).unwrap();

        let t0 = Utc::now();
        let first = f.engine.forecast(company, may(), t0).unwrap();
        let cached = f.engine.forecast(company, may(), t0 + Duration::hours(23)).unwrap();
        assert_eq!(first, cached);

        let refreshed = f.engine.forecast(company, may(), t0 + Duration::hours(25)).unwrap();
        assert!(refreshed.created_at > first.created_at);
        assert_eq!(f.engine.history(company, may()).unwrap().len(), 2);
    }

    #[test]
    fn records_outside_the_month_are_ignored() {
        let f = fixture();
        let company = CompanyId::new();
        f.records.insert(record(company, EntryKind::Income, 500.0, 31)).unwrap();
        let mut june = record(company, EntryKind::Income, 900.0, 1);
        june.details.date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        f.records.insert(june).unwrap();

        let totals = f.engine.monthly_totals(company, may()).unwrap();
        assert_eq!(totals.income, 500.0);
        assert_eq!(totals.expense, 0.0);
    }
}
