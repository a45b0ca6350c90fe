/// Outcome of a single handler invocation.
///
/// Handlers are heterogeneous (ledger, calendar, alerts, test doubles), so the
/// error side is an `anyhow::Error`; the dispatcher only needs its message.
pub type HandlerResult = anyhow::Result<()>;

/// Consumes one kind of message published through an `EventDispatcher`.
///
/// Delivery is **at-least-once**: a handler may see the same message more than
/// once and must converge to the same read-model state when it does.
pub trait EventHandler<M>: Send + Sync {
    /// Stable handler name used in logs and failure reports.
    fn name(&self) -> &str;

    fn handle(&self, message: &M) -> HandlerResult;
}

/// Adapter turning a closure into an `EventHandler`.
pub struct FnHandler<F> {
    name: String,
    f: F,
}

impl<F> FnHandler<F> {
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self { name: name.into(), f }
    }
}

impl<F> core::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FnHandler").field("name", &self.name).finish()
    }
}

impl<M, F> EventHandler<M> for FnHandler<F>
where
    F: Fn(&M) -> HandlerResult + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, message: &M) -> HandlerResult {
        (self.f)(message)
    }
}
