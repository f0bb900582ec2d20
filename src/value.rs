//! Typed access to context values.

use std::any::Any;

use crate::context::Context;

/// Look up `key` in `ctx` and return it as a `T`.
///
/// Returns `(T::default(), false)` if the key is missing or holds a value of
/// another type.
pub fn value<T>(ctx: &dyn Context, key: &str) -> (T, bool)
where
    T: Any + Clone + Default,
{
    match lookup(ctx, key) {
        Some(v) => (v, true),
        None => (T::default(), false),
    }
}

/// Like [`value`] but for types without a default.
pub fn lookup<T>(ctx: &dyn Context, key: &str) -> Option<T>
where
    T: Any + Clone,
{
    ctx.value(key)?.downcast_ref::<T>().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::context::{background, with_value};

    #[test]
    fn test_value_matching_type() {
        let ctx = with_value(background(), "key1", "key1".to_string());
        assert_eq!(value::<String>(&*ctx, "key1"), ("key1".to_string(), true));
    }

    #[test]
    fn test_value_missing_key() {
        let ctx = with_value(background(), "key1", "key1".to_string());
        assert_eq!(value::<String>(&*ctx, "key2"), (String::new(), false));
    }

    #[test]
    fn test_value_mismatched_type() {
        let ctx = with_value(background(), "key1", 1_i32);
        assert_eq!(value::<String>(&*ctx, "key1"), (String::new(), false));
        assert_eq!(value::<i32>(&*ctx, "key1"), (1, true));
    }

    #[test]
    fn test_lookup() {
        let ctx = with_value(background(), "port", 8080_u16);
        assert_eq!(lookup::<u16>(&*ctx, "port"), Some(8080));
        assert_eq!(lookup::<u32>(&*ctx, "port"), None);
    }
}
