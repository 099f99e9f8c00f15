use std::{hash::Hash, sync::Arc};

/// Name of a recorded stream.
///
/// Assigned when a [`Recorder`](crate::Recorder) is created and carried
/// through verdicts, failure messages, and log fields so that a failing
/// chain can be traced back to the stream it watched.
///
/// `StreamId` is cheap to clone. Equality uses string comparison with a
/// fast path for pointer equality when IDs share the same allocation.
#[derive(Debug, Clone, Ord, PartialOrd)]
pub struct StreamId(Arc<str>);

impl StreamId {
    pub fn new(id: &str) -> Self {
        Self(Arc::from(id))
    }

    /// Returns the string representation of this stream ID.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for StreamId {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for StreamId {}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Hash for StreamId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl From<&str> for StreamId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StreamId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}
