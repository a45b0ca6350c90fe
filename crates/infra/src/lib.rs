//! Infrastructure layer: storage, projectors, sync wiring, tax forecasts, workers.

pub mod config;
pub mod locks;
pub mod projections;
pub mod read_model;
pub mod sync;
pub mod tax_forecast;
pub mod workers;


pub use config::{ConfigError, StaticTaxProfiles, SyncConfig, TaxProfileSource};
pub use sync::{SyncEngine, SyncError, SyncStores};
pub use tax_forecast::{TaxError, TaxForecastEngine};
