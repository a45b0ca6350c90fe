//! Background workers.

pub mod forecast_scheduler;
pub mod periodic;

pub use forecast_scheduler::{ForecastScheduler, ForecastTarget};
pub use periodic::{PeriodicWorker, WorkerHandle};
