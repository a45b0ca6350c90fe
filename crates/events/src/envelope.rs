use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ledgersync_core::CompanyId;

use crate::Event;

/// Envelope for an event, carrying company scope and delivery metadata.
///
/// Notes:
/// - **Multi-tenancy** is enforced here via `company_id`; every projection write
///   is scoped to it.
/// - `event_id` is informational only. Delivery is at-least-once and handlers
///   dedupe on domain keys, not on this id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    company_id: CompanyId,
    occurred_at: DateTime<Utc>,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(company_id: CompanyId, payload: E) -> Self {
        Self::with_metadata(Uuid::now_v7(), company_id, Utc::now(), payload)
    }

    pub fn with_metadata(
        event_id: Uuid,
        company_id: CompanyId,
        occurred_at: DateTime<Utc>,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            company_id,
            occurred_at,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    /// When the upstream mutation was published (wall clock, not business date).
    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl<E> Event for EventEnvelope<E>
where
    E: Event,
{
    fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }
}
