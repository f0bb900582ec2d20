//! Combine two cancellable, deadline-bearing contexts into one.
//!
//! Two combinators are provided:
//!
//! - [`or_context`]: the result ends as soon as either input ends, and its
//!   deadline is the earlier of the two
//! - [`and_context`]: the result ends only once both inputs have ended, and its
//!   deadline is the later of the two
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use ctxjoin::context::{background, with_cancel, with_timeout};
//! use ctxjoin::{Context, or_context};
//!
//! # async fn run() {
//! let (request, cancel) = with_cancel(background());
//! let (budget, _budget_handle) = with_timeout(background(), Duration::from_secs(5));
//!
//! let ctx = or_context(request, budget);
//! cancel.cancel();
//! ctx.done().unwrap().fired().await;
//! assert!(ctx.err().unwrap().is_canceled());
//! # }
//! ```
//!
//! The combined context only observes its inputs. A background watcher is
//! started the first time its done signal is requested, and exits once the
//! policy's condition is met. Watchers run on a runtime owned by this crate,
//! so they keep running after the caller's runtime shuts down.

pub mod combine;
pub mod config;
pub mod context;
mod spawn;
pub mod value;

pub use combine::{
    And, AndContext, BothValues, CombinedContext, EitherValues, Or, OrContext, Policy, TwoValues,
    and_context, or_context,
};
pub use config::{ConfigError, SpawnMode, WatcherConfig};
pub use context::{Context, ContextError, DoneSignal, SharedContext, Value};
pub use value::{lookup, value};
