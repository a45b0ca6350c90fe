//! In-process publish/subscribe dispatcher.
//!
//! The dispatcher is the fan-out point between upstream mutations and the
//! read-model projectors:
//!
//! ```text
//! upstream write succeeds → publish(event) → handler 1 → handler 2 → ... → PublishReport
//! ```
//!
//! ## Delivery contract
//!
//! - **Synchronous, sequential**: handlers for one event run one after another on
//!   the publishing thread, in registration order. Two handlers for the same event
//!   never interleave.
//! - **Fault isolation**: a handler that returns an error or panics is recorded in the
//!   `PublishReport` and logged; the remaining handlers still run. `publish` itself
//!   never fails.
//! - **At-least-once**: nothing is persisted; a crash mid-dispatch loses the rest of
//!   the fan-out. Handlers must be idempotent.
//!
//! The dispatcher is an explicit value (usually behind an `Arc`), so tests get
//! isolated registries and nothing leaks between them.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, warn};

use crate::{Event, EventHandler};

/// Identity of one registration, returned by `subscribe`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// One handler failure observed during a `publish` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    pub handler_id: HandlerId,
    pub handler: String,
    pub event_type: &'static str,
    pub message: String,
    pub panicked: bool,
}

/// Result of fanning one event out to its handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub event_type: &'static str,
    /// Number of handlers invoked (successful or not).
    pub invoked: usize,
    pub failures: Vec<HandlerFailure>,
}

impl PublishReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.invoked - self.failures.len()
    }
}

struct Registration<M> {
    id: HandlerId,
    handler: Arc<dyn EventHandler<M>>,
}

impl<M> Clone for Registration<M> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handler: Arc::clone(&self.handler),
        }
    }
}

/// Registry of handlers keyed by event name.
pub struct EventDispatcher<M> {
    registry: RwLock<HashMap<String, Vec<Registration<M>>>>,
    next_id: AtomicU64,
}

impl<M> Default for EventDispatcher<M> {
    fn default() -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<M> core::fmt::Debug for EventDispatcher<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<&str, usize> =
            registry.iter().map(|(k, v)| (k.as_str(), v.len())).collect();
        f.debug_struct("EventDispatcher").field("handlers", &counts).finish()
    }
}

impl<M> EventDispatcher<M>
where
    M: Event,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event_type`. Handlers run in registration order.
    pub fn subscribe(
        &self,
        event_type: impl Into<String>,
        handler: Arc<dyn EventHandler<M>>,
    ) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let event_type = event_type.into();
        debug!(event_type = %event_type, handler = handler.name(), "handler subscribed");

        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        registry
            .entry(event_type)
            .or_default()
            .push(Registration { id, handler });
        id
    }

    /// Remove one registration. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, event_type: &str, id: HandlerId) -> bool {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        let Some(handlers) = registry.get_mut(event_type) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|r| r.id != id);
        let removed = handlers.len() != before;
        if handlers.is_empty() {
            registry.remove(event_type);
        }
        removed
    }

    /// Clear the registrations for one event name, or every registration when `None`.
    pub fn unsubscribe_all(&self, event_type: Option<&str>) {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        match event_type {
            Some(name) => {
                registry.remove(name);
            }
            None => registry.clear(),
        }
    }

    pub fn handler_count(&self, event_type: &str) -> usize {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        registry.get(event_type).map_or(0, Vec::len)
    }

    /// Invoke every handler currently registered for the message's event type.
    ///
    /// The registry lock is released before any handler runs, so handlers may
    /// publish or (un)subscribe re-entrantly. Changes made during a publish take
    /// effect on the next one.
    pub fn publish(&self, message: &M) -> PublishReport {
        let event_type = message.event_type();
        let handlers: Vec<Registration<M>> = {
            let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
            registry.get(event_type).cloned().unwrap_or_default()
        };

        let mut report = PublishReport {
            event_type,
            invoked: handlers.len(),
            failures: Vec::new(),
        };

        for reg in handlers {
            let outcome = catch_unwind(AssertUnwindSafe(|| reg.handler.handle(message)));
            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some((format!("{err:#}"), false)),
                Err(panic) => Some((panic_message(panic.as_ref()), true)),
            };

            if let Some((message, panicked)) = failure {
                warn!(
                    event_type,
                    handler = reg.handler.name(),
                    panicked,
                    error = %message,
                    "event handler failed"
                );
                report.failures.push(HandlerFailure {
                    handler_id: reg.id,
                    handler: reg.handler.name().to_string(),
                    event_type,
                    message,
                    panicked,
                });
            }
        }

        debug!(
            event_type,
            invoked = report.invoked,
            failed = report.failures.len(),
            "event published"
        );
        report
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
