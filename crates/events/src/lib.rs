//! Event mechanics: the `Event` contract, envelopes, and the in-process dispatcher.

pub mod dispatcher;
pub mod envelope;
pub mod event;
pub mod handler;

pub use dispatcher::{EventDispatcher, HandlerFailure, HandlerId, PublishReport};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::{EventHandler, FnHandler, HandlerResult};
