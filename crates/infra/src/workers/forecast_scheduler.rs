use std::io;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use ledgersync_core::{CompanyId, MonthKey};

use crate::config::SyncConfig;
use crate::tax_forecast::TaxForecastEngine;

use super::{PeriodicWorker, WorkerHandle};

/// Which company-months the scheduler keeps fresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForecastTarget {
    /// A fixed month.
    Month(CompanyId, MonthKey),
    /// Whatever the current wall-clock month is at each run.
    CurrentMonth(CompanyId),
}

impl ForecastTarget {
    fn resolve(&self) -> (CompanyId, MonthKey) {
        match self {
            ForecastTarget::Month(company, month) => (*company, *month),
            ForecastTarget::CurrentMonth(company) => (*company, MonthKey::current()),
        }
    }
}

/// Regenerates tax forecasts on a fixed interval.
///
/// Every run generates a new forecast row per target, bypassing the freshness
/// cache. One failing target does not stop the others; the run reports the
/// first error after trying all of them.
pub struct ForecastScheduler;

impl ForecastScheduler {
    pub const WORKER_NAME: &'static str = "tax-forecast";

    pub fn spawn(
        engine: Arc<TaxForecastEngine>,
        targets: Vec<ForecastTarget>,
        config: &SyncConfig,
    ) -> io::Result<WorkerHandle> {
        info!(targets = targets.len(), interval_secs = config.forecast_interval.as_secs(), "starting forecast scheduler");
        PeriodicWorker::spawn(Self::WORKER_NAME, config.forecast_interval, move || {
            run_once(&engine, &targets)
        })
    }
}

pub(crate) fn run_once(engine: &TaxForecastEngine, targets: &[ForecastTarget]) -> anyhow::Result<()> {
    let mut first_error = None;
    for target in targets {
        let (company, month) = target.resolve();
        let outcome = engine
            .generate_forecast(company, month)
            .with_context(|| format!("forecast for company {company} month {month}"));
        if let Err(err) = outcome {
            first_error.get_or_insert(err);
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
