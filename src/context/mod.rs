//! The context contract consumed and produced by the combinators.
//!
//! A context carries:
//! - An optional deadline
//! - An optional done signal (absent means it can never end)
//! - A termination cause, present only once the done signal has fired
//! - A string-keyed bag of values
//!
//! The [`base`] constructors provide the usual root, cancellable, deadline and
//! value-carrying contexts.

pub mod base;
mod error;
mod signal;

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

pub use base::{CancelHandle, background, with_cancel, with_deadline, with_timeout, with_value};
pub use error::ContextError;
pub use signal::DoneSignal;

/// A value stored in a context.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Shared, type-erased context handle.
pub type SharedContext = Arc<dyn Context>;

/// A cancellable, deadline-bearing, key/value-scoped execution context.
pub trait Context: Send + Sync {
    /// The time at which this context ends on its own, if any.
    fn deadline(&self) -> Option<Instant>;

    /// Signal that fires when this context ends.
    ///
    /// `None` means the context can never end.
    fn done(&self) -> Option<DoneSignal>;

    /// Why this context ended. `None` until [`Context::done`] has fired.
    fn err(&self) -> Option<ContextError>;

    /// Look up the value stored under `key`.
    fn value(&self, key: &str) -> Option<Value>;
}

impl dyn Context {
    /// Whether this context has ended.
    pub fn is_done(&self) -> bool {
        self.done().is_some_and(|signal| signal.is_fired())
    }
}
