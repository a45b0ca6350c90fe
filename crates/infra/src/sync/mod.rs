//! Event-driven synchronization of the financial read models.
//!
//! `SyncEngine` subscribes the projector handlers to an `EventDispatcher`;
//! `FinancialSync` runs the ledger → installments → accounting log → monthly
//! aggregate steps for one event.

pub mod engine;
pub mod handlers;
pub mod pipeline;

use thiserror::Error;

use ledgersync_accounting::SyncEvent;
use ledgersync_events::EventEnvelope;

use crate::projections::InstallmentError;
use crate::read_model::StoreError;

pub use engine::{SyncEngine, SyncStores};
pub use handlers::{CalendarHandler, InstallmentPaidHandler, LedgerHandler, StockAlertHandler};
pub use pipeline::FinancialSync;

/// What the dispatcher carries.
pub type SyncEnvelope = EventEnvelope<SyncEvent>;

/// A pipeline step that failed after the ledger write went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncStep {
    Ledger,
    Installments,
    AccountingLog,
    MonthlyAggregate,
}

impl SyncStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStep::Ledger => "ledger",
            SyncStep::Installments => "installments",
            SyncStep::AccountingLog => "accounting_log",
            SyncStep::MonthlyAggregate => "monthly_aggregate",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepFailure {
    pub step: SyncStep,
    pub message: String,
}

impl StepFailure {
    fn new(step: SyncStep, err: impl core::fmt::Display) -> Self {
        Self {
            step,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Installment(#[from] InstallmentError),

    #[error("failed to snapshot event payload: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// The ledger is up to date but later steps fell behind.
    #[error("sync steps failed: {}", describe_steps(.0))]
    Steps(Vec<StepFailure>),
}

impl SyncError {
    pub fn failed_steps(&self) -> Vec<SyncStep> {
        match self {
            SyncError::Steps(steps) => steps.iter().map(|s| s.step).collect(),
            SyncError::Installment(_) => vec![SyncStep::Installments],
            _ => vec![SyncStep::Ledger],
        }
    }
}

fn describe_steps(steps: &[StepFailure]) -> String {
    steps
        .iter()
        .map(|s| format!("{}: {}", s.step.as_str(), s.message))
        .collect::<Vec<_>>()
        .join("; ")
}
