//! Root, cancellable, deadline and value-carrying contexts.

use std::any::Any;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::WatcherConfig;
use crate::context::{Context, ContextError, DoneSignal, SharedContext, Value};
use crate::spawn::{spawn_timer, spawn_watcher};

/// The root context: never ends, has no deadline and no values.
struct Background;

impl Context for Background {
    fn deadline(&self) -> Option<Instant> {
        None
    }

    fn done(&self) -> Option<DoneSignal> {
        None
    }

    fn err(&self) -> Option<ContextError> {
        None
    }

    fn value(&self, _key: &str) -> Option<Value> {
        None
    }
}

/// Return a context that never ends.
pub fn background() -> SharedContext {
    Arc::new(Background)
}

/// A context that ends on explicit cancellation, on its deadline, or when
/// its parent ends.
struct CancelContext {
    parent: SharedContext,
    deadline: Option<Instant>,
    signal: DoneSignal,
    /// Written under the same lock that fires `signal`.
    cause: Mutex<Option<ContextError>>,
}

impl CancelContext {
    fn new(parent: SharedContext, deadline: Option<Instant>) -> Arc<Self> {
        let ctx = Arc::new(Self {
            parent,
            deadline,
            signal: DoneSignal::new(),
            cause: Mutex::new(None),
        });
        ctx.propagate_from_parent(WatcherConfig::global());
        ctx
    }

    fn propagate_from_parent(self: &Arc<Self>, config: &WatcherConfig) {
        let Some(parent_done) = self.parent.done() else {
            return;
        };

        if parent_done.is_fired() {
            self.cancel(self.inherited_cause());
            return;
        }

        let ctx = Arc::clone(self);
        let spawned = spawn_watcher(config, async move {
            let own = ctx.signal.clone();
            futures::future::select(Box::pin(parent_done.fired()), Box::pin(own.fired())).await;
            if parent_done.is_fired() {
                ctx.cancel(ctx.inherited_cause());
            }
        });
        if let Err(e) = spawned {
            self.watcher_failed("parent watcher", e);
        }
    }

    fn watcher_failed(&self, what: &str, e: std::io::Error) {
        tracing::error!("Failed to start {}, ending context: {}", what, e);
        self.cancel(ContextError::WatcherUnavailable {
            reason: e.to_string(),
        });
    }

    fn inherited_cause(&self) -> ContextError {
        self.parent.err().unwrap_or(ContextError::Canceled)
    }

    fn cancel(&self, cause: ContextError) {
        let mut slot = self
            .cause
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.is_some() {
            return;
        }
        tracing::trace!(cause = %cause, "Context ended");
        *slot = Some(cause);
        self.signal.fire();
    }
}

impl Context for CancelContext {
    fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    fn done(&self) -> Option<DoneSignal> {
        Some(self.signal.clone())
    }

    fn err(&self) -> Option<ContextError> {
        self.cause
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn value(&self, key: &str) -> Option<Value> {
        self.parent.value(key)
    }
}

/// Cancels its context when the last [`CancelHandle`] goes away.
struct CancelOnDrop {
    ctx: Arc<CancelContext>,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.ctx.cancel(ContextError::Canceled);
    }
}

/// Handle that ends the context it was created with.
///
/// Dropping the last clone cancels the context, which also releases the
/// watcher that links it to its parent.
#[derive(Clone)]
pub struct CancelHandle {
    guard: Arc<CancelOnDrop>,
}

impl CancelHandle {
    fn new(ctx: Arc<CancelContext>) -> Self {
        Self {
            guard: Arc::new(CancelOnDrop { ctx }),
        }
    }

    /// End the context with [`ContextError::Canceled`].
    ///
    /// Has no effect if the context already ended.
    pub fn cancel(&self) {
        self.guard.ctx.cancel(ContextError::Canceled);
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("done", &self.guard.ctx.signal.is_fired())
            .finish()
    }
}

/// Derive a context that ends when `handle.cancel()` is called, when every
/// handle is dropped, or when `parent` ends.
pub fn with_cancel(parent: SharedContext) -> (SharedContext, CancelHandle) {
    let deadline = parent.deadline();
    let ctx = CancelContext::new(parent, deadline);
    let shared: SharedContext = ctx.clone();
    (shared, CancelHandle::new(ctx))
}

/// Derive a context that also ends with [`ContextError::DeadlineExceeded`] at `deadline`.
///
/// If the parent's deadline is earlier it stays in effect and no timer is armed.
pub fn with_deadline(parent: SharedContext, deadline: Instant) -> (SharedContext, CancelHandle) {
    if parent.deadline().is_some_and(|current| current <= deadline) {
        return with_cancel(parent);
    }

    let ctx = CancelContext::new(parent, Some(deadline));
    if deadline <= Instant::now() {
        ctx.cancel(ContextError::DeadlineExceeded);
    } else {
        let expiring = Arc::clone(&ctx);
        let armed = spawn_timer(
            WatcherConfig::global(),
            deadline,
            ctx.signal.clone(),
            move || expiring.cancel(ContextError::DeadlineExceeded),
        );
        if let Err(e) = armed {
            ctx.watcher_failed("deadline timer", e);
        }
    }

    let shared: SharedContext = ctx.clone();
    (shared, CancelHandle::new(ctx))
}

/// Shorthand for `with_deadline(parent, Instant::now() + timeout)`.
pub fn with_timeout(parent: SharedContext, timeout: Duration) -> (SharedContext, CancelHandle) {
    with_deadline(parent, Instant::now() + timeout)
}

/// A context carrying one key/value pair on top of its parent.
struct ValueContext {
    parent: SharedContext,
    key: String,
    value: Value,
}

impl Context for ValueContext {
    fn deadline(&self) -> Option<Instant> {
        self.parent.deadline()
    }

    fn done(&self) -> Option<DoneSignal> {
        self.parent.done()
    }

    fn err(&self) -> Option<ContextError> {
        self.parent.err()
    }

    fn value(&self, key: &str) -> Option<Value> {
        if self.key == key {
            return Some(Arc::clone(&self.value));
        }
        self.parent.value(key)
    }
}

/// Derive a context that resolves `key` to `value`.
pub fn with_value<V>(parent: SharedContext, key: impl Into<String>, value: V) -> SharedContext
where
    V: Any + Send + Sync,
{
    Arc::new(ValueContext {
        parent,
        key: key.into(),
        value: Arc::new(value),
    })
}
