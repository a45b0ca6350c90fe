//! `ledgersync-core`: shared primitives for the synchronization engine.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod money;
pub mod month;
pub mod value_object;

pub use error::{DomainError, DomainResult};
pub use id::{CompanyId, RecordId, ReferenceId};
pub use money::Money;
pub use month::MonthKey;
pub use value_object::ValueObject;
