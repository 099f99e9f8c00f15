use std::{hash::Hash, sync::Arc};

/// Opaque handle for a test context.
///
/// The [`Registry`](crate::Registry) groups recorders under a `ContextId`
/// so that "evaluate every chain declared so far, everywhere" is a single
/// call scoped to one test. The handle carries no meaning for the engine;
/// a test name or a fixture address both work.
///
/// `ContextId` is cheap to clone and usable as a map key.
#[derive(Debug, Clone, Ord, PartialOrd)]
pub struct ContextId(Arc<str>);

impl ContextId {
    pub fn new(id: &str) -> Self {
        Self(Arc::from(id))
    }

    /// Returns the string representation of this context ID.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for ContextId {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for ContextId {}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Hash for ContextId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl From<&str> for ContextId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ContextId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}
