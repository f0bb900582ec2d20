//! One-shot done signal shared between a context and its observers.
//!
//! A [`DoneSignal`] starts pending and can be fired exactly once. Firing wakes
//! every waiter, whether it is awaiting [`DoneSignal::fired`] on some executor
//! or blocked in [`DoneSignal::wait`] on a plain thread.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::Notify;

struct SignalState {
    fired: AtomicBool,
    /// Guards the transition for blocking waiters.
    lock: Mutex<bool>,
    cond: Condvar,
    notify: Notify,
}

/// Cloneable handle to a single-fire, broadcast completion flag.
#[derive(Clone)]
pub struct DoneSignal {
    state: Arc<SignalState>,
}

impl DoneSignal {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(SignalState {
                fired: AtomicBool::new(false),
                lock: Mutex::new(false),
                cond: Condvar::new(),
                notify: Notify::new(),
            }),
        }
    }

    /// Fire the signal. Returns `true` only for the call that fired it.
    pub(crate) fn fire(&self) -> bool {
        let mut fired = self
            .state
            .lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *fired {
            return false;
        }
        *fired = true;
        self.state.fired.store(true, Ordering::Release);
        drop(fired);

        self.state.cond.notify_all();
        self.state.notify.notify_waiters();
        true
    }

    /// Whether the signal has fired.
    pub fn is_fired(&self) -> bool {
        self.state.fired.load(Ordering::Acquire)
    }

    /// Wait until the signal fires.
    ///
    /// Does not depend on any particular async runtime.
    pub async fn fired(&self) {
        loop {
            let notified = self.state.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent fire cannot be missed.
            notified.as_mut().enable();
            if self.is_fired() {
                return;
            }
            notified.await;
        }
    }

    /// Block the current thread until the signal fires.
    ///
    /// Must not be called from inside an async task.
    pub fn wait(&self) {
        let mut fired = self
            .state
            .lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        while !*fired {
            fired = self
                .state
                .cond
                .wait(fired)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Block for at most `timeout`. Returns whether the signal fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let until = Instant::now() + timeout;
        let mut fired = self
            .state
            .lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        while !*fired {
            let remaining = until.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            fired = self
                .state
                .cond
                .wait_timeout(fired, remaining)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|poisoned| poisoned.into_inner().0);
        }
        true
    }

    /// Whether both handles refer to the same underlying signal.
    pub fn ptr_eq(&self, other: &DoneSignal) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl fmt::Debug for DoneSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DoneSignal")
            .field("fired", &self.is_fired())
            .finish()
    }
}
