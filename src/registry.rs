use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{ContextId, Recorder, StreamId, Value};

/// Maps test contexts to the recorders created under them.
///
/// Owned by the harness-integration layer, never a hidden singleton.
/// Registering recorders under a [`ContextId`] lets one
/// [`Round::run_all`](crate::Round::run_all) call evaluate every chain
/// declared so far, on every stream of that test; deregistering at
/// teardown releases them.
///
/// # Example
///
/// ```ignore
/// let registry: Registry<String> = Registry::new();
/// let context = ContextId::from("login-test");
///
/// let client = registry.create(&context, "client");
/// let server = registry.create(&context, "server");
///
/// // ... declare chains, drive the transport ...
///
/// let report = Round::new(deadline).run_all(&registry, &context).await;
/// registry.deregister(&context);
/// ```
pub struct Registry<V: Value> {
    entries: Mutex<HashMap<ContextId, Vec<Recorder<V>>>>,
}

impl<V: Value> Registry<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Create a recorder and register it under `context` in one step.
    pub fn create(&self, context: &ContextId, id: impl Into<StreamId>) -> Recorder<V> {
        let recorder = Recorder::new(id);
        self.register(context, recorder.clone());
        recorder
    }

    /// Register an existing recorder under `context`.
    pub fn register(&self, context: &ContextId, recorder: Recorder<V>) {
        self.lock()
            .entry(context.clone())
            .or_default()
            .push(recorder);
    }

    /// Returns a snapshot of the recorders registered under `context`.
    ///
    /// Unknown contexts yield an empty set.
    pub fn recorders(&self, context: &ContextId) -> Vec<Recorder<V>> {
        self.lock().get(context).cloned().unwrap_or_default()
    }

    /// Remove a context at teardown, returning its recorders.
    pub fn deregister(&self, context: &ContextId) -> Vec<Recorder<V>> {
        self.lock().remove(context).unwrap_or_default()
    }

    /// Returns the number of registered contexts.
    pub fn context_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ContextId, Vec<Recorder<V>>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Value> Default for Registry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Value> fmt::Debug for Registry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("contexts", &self.context_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_registers_under_the_context() {
        let registry: Registry<String> = Registry::new();
        let context = ContextId::from("test");

        let recorder = registry.create(&context, "stream");
        let recorders = registry.recorders(&context);

        assert_eq!(recorders.len(), 1);
        assert_eq!(recorders[0].id(), recorder.id());
    }

    #[test]
    fn contexts_are_isolated() {
        let registry: Registry<String> = Registry::new();
        let first = ContextId::from("first");
        let second = ContextId::from("second");

        registry.create(&first, "stream");

        assert_eq!(registry.recorders(&first).len(), 1);
        assert!(registry.recorders(&second).is_empty());
    }

    #[test]
    fn deregister_removes_the_context() {
        let registry: Registry<String> = Registry::new();
        let context = ContextId::from("test");

        registry.create(&context, "one");
        registry.create(&context, "two");

        let removed = registry.deregister(&context);
        assert_eq!(removed.len(), 2);
        assert!(registry.recorders(&context).is_empty());
        assert_eq!(registry.context_count(), 0);
    }
}
