//! The OR and AND combination rules.
//!
//! A [`Policy`] supplies the three things that differ between the two
//! combinators; everything else lives in [`CombinedContext`](super::CombinedContext).
//!
//! ```text
//! ┌──────────┬──────────────────────┬─────────────────────┬──────────────────────┐
//! │ Policy   │ Ends when            │ Deadline            │ Value lookup         │
//! ├──────────┼──────────────────────┼─────────────────────┼──────────────────────┤
//! │ Or       │ either side ends     │ earlier of the two  │ either side resolves │
//! │ And      │ both sides have ended│ later of the two    │ both sides resolve   │
//! └──────────┴──────────────────────┴─────────────────────┴──────────────────────┘
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use crate::combine::pair::{BothValues, EitherValues};
use crate::context::{DoneSignal, Value};

/// Combination rule for two contexts.
pub trait Policy: Send + Sync + 'static {
    /// Short name used in logs.
    const NAME: &'static str;

    /// Choose between two present deadlines.
    fn pick_deadline(left: Instant, right: Instant) -> Instant;

    /// Complete once the combined context should end.
    ///
    /// An absent signal never fires. Never called with both signals absent.
    fn watch(
        left: Option<DoneSignal>,
        right: Option<DoneSignal>,
    ) -> impl Future<Output = ()> + Send + 'static;

    /// Combine the values both sides resolved for one key.
    fn combine_values(left: Option<Value>, right: Option<Value>) -> Option<Value>;
}

/// Ends as soon as either side ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct Or;

impl Policy for Or {
    const NAME: &'static str = "or";

    fn pick_deadline(left: Instant, right: Instant) -> Instant {
        if left < right { left } else { right }
    }

    fn watch(
        left: Option<DoneSignal>,
        right: Option<DoneSignal>,
    ) -> impl Future<Output = ()> + Send + 'static {
        async move {
            match (left, right) {
                (Some(left), Some(right)) => {
                    futures::future::select(Box::pin(left.fired()), Box::pin(right.fired())).await;
                }
                (Some(only), None) | (None, Some(only)) => only.fired().await,
                (None, None) => {}
            }
        }
    }

    fn combine_values(left: Option<Value>, right: Option<Value>) -> Option<Value> {
        if left.is_none() && right.is_none() {
            return None;
        }
        let pair: EitherValues = EitherValues::new(left, right);
        Some(Arc::new(pair))
    }
}

/// Ends only once both sides have ended.
#[derive(Debug, Clone, Copy, Default)]
pub struct And;

impl Policy for And {
    const NAME: &'static str = "and";

    fn pick_deadline(left: Instant, right: Instant) -> Instant {
        if left > right { left } else { right }
    }

    fn watch(
        left: Option<DoneSignal>,
        right: Option<DoneSignal>,
    ) -> impl Future<Output = ()> + Send + 'static {
        async move {
            match (left, right) {
                (Some(left), Some(right)) => {
                    futures::future::join(left.fired(), right.fired()).await;
                }
                (Some(only), None) | (None, Some(only)) => only.fired().await,
                (None, None) => {}
            }
        }
    }

    fn combine_values(left: Option<Value>, right: Option<Value>) -> Option<Value> {
        let (first, second) = left.zip(right)?;
        let pair: BothValues = BothValues::new(first, second);
        Some(Arc::new(pair))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tokio_test::{assert_pending, assert_ready, task};

    fn value<V: std::any::Any + Send + Sync>(v: V) -> Option<Value> {
        Some(Arc::new(v))
    }

    #[test]
    fn test_deadline_tie_breaks() {
        let early = Instant::now();
        let late = early + Duration::from_secs(1);
        assert_eq!(Or::pick_deadline(early, late), early);
        assert_eq!(Or::pick_deadline(late, early), early);
        assert_eq!(And::pick_deadline(early, late), late);
        assert_eq!(And::pick_deadline(late, early), late);
    }

    #[test]
    fn test_or_watch_completes_on_either() {
        let left = DoneSignal::new();
        let right = DoneSignal::new();
        let mut watcher = task::spawn(Or::watch(Some(left.clone()), Some(right.clone())));
        assert_pending!(watcher.poll());

        right.fire();
        assert_ready!(watcher.poll());
        assert!(!left.is_fired());
    }

    #[test]
    fn test_or_watch_ignores_absent_side() {
        let left = DoneSignal::new();
        let mut watcher = task::spawn(Or::watch(Some(left.clone()), None));
        assert_pending!(watcher.poll());

        left.fire();
        assert_ready!(watcher.poll());
    }

    #[test]
    fn test_and_watch_waits_for_both() {
        let left = DoneSignal::new();
        let right = DoneSignal::new();
        let mut watcher = task::spawn(And::watch(Some(left.clone()), Some(right.clone())));
        assert_pending!(watcher.poll());

        left.fire();
        assert_pending!(watcher.poll());

        right.fire();
        assert_ready!(watcher.poll());
    }

    #[test]
    fn test_and_watch_absent_side_never_contributes() {
        let right = DoneSignal::new();
        let mut watcher = task::spawn(And::watch(None, Some(right.clone())));
        assert_pending!(watcher.poll());

        right.fire();
        assert_ready!(watcher.poll());
    }

    #[test]
    fn test_or_values_need_one_side() {
        assert!(Or::combine_values(None, None).is_none());

        let combined = Or::combine_values(value(1234_i32), None).unwrap();
        let pair = combined.downcast_ref::<EitherValues>().unwrap();
        assert_eq!(pair.first.as_ref().unwrap().downcast_ref::<i32>(), Some(&1234));
        assert!(pair.second.is_none());
    }

    #[test]
    fn test_and_values_need_both_sides() {
        assert!(And::combine_values(value(1234_i32), None).is_none());
        assert!(And::combine_values(None, value("1234")).is_none());

        let combined = And::combine_values(value(1234_i32), value("1234")).unwrap();
        let pair = combined.downcast_ref::<BothValues>().unwrap();
        assert_eq!(pair.first.downcast_ref::<i32>(), Some(&1234));
        assert_eq!(pair.second.downcast_ref::<&str>(), Some(&"1234"));
    }
}
