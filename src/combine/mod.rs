//! Combining two contexts into one.
//!
//! - [`or_context`]: ends as soon as either input ends
//! - [`and_context`]: ends only once both inputs have ended
//!
//! Combined contexts implement [`Context`](crate::context::Context) themselves,
//! so N-way combinations are built by nesting.

mod combined;
mod pair;
mod policy;

use std::sync::Arc;

pub use combined::CombinedContext;
pub use pair::{BothValues, EitherValues, TwoValues};
pub use policy::{And, Or, Policy};

use crate::context::SharedContext;

/// Context that ends when either input ends.
pub type OrContext = CombinedContext<Or>;

/// Context that ends when both inputs have ended.
pub type AndContext = CombinedContext<And>;

/// Combine two contexts with OR semantics.
pub fn or_context(left: SharedContext, right: SharedContext) -> SharedContext {
    Arc::new(OrContext::new(left, right))
}

/// Combine two contexts with AND semantics.
pub fn and_context(left: SharedContext, right: SharedContext) -> SharedContext {
    Arc::new(AndContext::new(left, right))
}
