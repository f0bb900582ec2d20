//! The shared shape of an OR- or AND-combined context.

use std::fmt;
use std::marker::PhantomData;
use std::sync::OnceLock;
use std::time::Instant;

use crate::combine::policy::Policy;
use crate::config::WatcherConfig;
use crate::context::{Context, ContextError, DoneSignal, SharedContext, Value};
use crate::spawn::spawn_watcher;

/// A context derived from two others under policy `P`.
///
/// The inputs are only observed, never cancelled. Deadline, done signal and
/// termination cause are each computed at most once, on first use.
pub struct CombinedContext<P: Policy> {
    left: SharedContext,
    right: SharedContext,
    config: WatcherConfig,
    deadline: OnceLock<Option<Instant>>,
    done: OnceLock<Option<DoneSignal>>,
    err: OnceLock<Option<ContextError>>,
    /// Set when the watcher could not be started.
    watcher_failure: OnceLock<String>,
    _policy: PhantomData<fn() -> P>,
}

impl<P: Policy> CombinedContext<P> {
    /// Combine two contexts using the process-wide watcher configuration.
    pub fn new(left: SharedContext, right: SharedContext) -> Self {
        Self::with_config(left, right, WatcherConfig::global().clone())
    }

    /// Combine two contexts, spawning the watcher according to `config`.
    pub fn with_config(left: SharedContext, right: SharedContext, config: WatcherConfig) -> Self {
        Self {
            left,
            right,
            config,
            deadline: OnceLock::new(),
            done: OnceLock::new(),
            err: OnceLock::new(),
            watcher_failure: OnceLock::new(),
            _policy: PhantomData,
        }
    }

    /// The left input.
    pub fn left(&self) -> &SharedContext {
        &self.left
    }

    /// The right input.
    pub fn right(&self) -> &SharedContext {
        &self.right
    }

    fn start_watcher(&self) -> Option<DoneSignal> {
        let left = self.left.done();
        let right = self.right.done();
        if left.is_none() && right.is_none() {
            return None;
        }

        let derived = DoneSignal::new();
        let fire = derived.clone();
        tracing::trace!(policy = P::NAME, "Starting combined context watcher");
        let spawned = spawn_watcher(&self.config, async move {
            P::watch(left, right).await;
            fire.fire();
            tracing::trace!(policy = P::NAME, "Combined context done");
        });
        if let Err(e) = spawned {
            tracing::error!(policy = P::NAME, "Failed to start combined context watcher: {}", e);
            let _ = self.watcher_failure.set(e.to_string());
            derived.fire();
        }
        Some(derived)
    }
}

impl<P: Policy> Context for CombinedContext<P> {
    fn deadline(&self) -> Option<Instant> {
        *self
            .deadline
            .get_or_init(|| match (self.left.deadline(), self.right.deadline()) {
                (Some(left), Some(right)) => Some(P::pick_deadline(left, right)),
                (left, right) => left.or(right),
            })
    }

    fn done(&self) -> Option<DoneSignal> {
        self.done.get_or_init(|| self.start_watcher()).clone()
    }

    fn err(&self) -> Option<ContextError> {
        match self.done() {
            Some(signal) if signal.is_fired() => self
                .err
                .get_or_init(|| match self.watcher_failure.get() {
                    Some(reason) => Some(ContextError::WatcherUnavailable {
                        reason: reason.clone(),
                    }),
                    None => ContextError::join(self.left.err(), self.right.err()),
                })
                .clone(),
            _ => None,
        }
    }

    fn value(&self, key: &str) -> Option<Value> {
        P::combine_values(self.left.value(key), self.right.value(key))
    }
}

impl<P: Policy> fmt::Debug for CombinedContext<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedContext")
            .field("policy", &P::NAME)
            .field("done", &self.done.get())
            .field("err", &self.err.get())
            .finish_non_exhaustive()
    }
}
