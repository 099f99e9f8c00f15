use std::fmt;

/// Marker trait for values observed on a recorded stream.
///
/// Implement this for whatever unit your system under test emits (often an
/// enum or a plain `String`). Values must be `Clone + Debug + Send + Sync +
/// 'static` because they:
/// - Are buffered in a shared history and fanned out to evaluation tasks (Clone, Sync)
/// - Cross task boundaries and live in spawned tasks (Send, 'static)
/// - Appear in failure messages (Debug)
///
/// The engine never interprets a value itself; only predicates do.
///
/// # Example
///
/// ```rust
/// use vigil::Value;
///
/// #[derive(Clone, Debug)]
/// enum Frame {
///     Text(String),
///     Ping,
/// }
///
/// impl Value for Frame {}
/// ```
pub trait Value: Clone + fmt::Debug + Send + Sync + 'static {
    /// Returns the textual form of this value, if it has one natively.
    ///
    /// Substring and pattern predicates use this as a fast path. When it
    /// returns `None` the value is canonically serialized instead (see
    /// [`contains`](crate::contains) / [`matches`](crate::matches)).
    fn as_text(&self) -> Option<&str> {
        None
    }
}

impl Value for String {
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

impl Value for &'static str {
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }
}

macro_rules! impl_value {
    ($($ty:ty),* $(,)?) => {
        $(impl Value for $ty {})*
    };
}

impl_value!(bool, i32, i64, u32, u64, usize, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_expose_text() {
        assert_eq!(String::from("hello").as_text(), Some("hello"));
        assert_eq!("hello".as_text(), Some("hello"));
    }

    #[test]
    fn scalars_have_no_text() {
        assert_eq!(42_i64.as_text(), None);
        assert_eq!(true.as_text(), None);
    }
}
