//! Pair of values resolved from both sides of a combined context.

use crate::context::Value;

/// The values two combined contexts resolved for the same key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TwoValues<A, B> {
    /// Value from the left context.
    pub first: A,
    /// Value from the right context.
    pub second: B,
}

impl<A, B> TwoValues<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

/// What an OR-combined context resolves: either side may be missing.
pub type EitherValues = TwoValues<Option<Value>, Option<Value>>;

/// What an AND-combined context resolves: both sides are present.
pub type BothValues = TwoValues<Value, Value>;
