/// A domain-agnostic event.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **named** (the dispatcher routes on `event_type`)
/// - fire-and-forget; delivery metadata lives on the envelope, not the event
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "payment.created").
    fn event_type(&self) -> &'static str;
}
