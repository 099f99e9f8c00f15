use std::fmt;

use crate::condition::{Condition, StepOutcome};
use crate::{Error, Predicate, Recorder, Result, StepPolicy, Value};

/// An ordered sequence of conditions declared against one recorder.
///
/// Chains are immutable once registered. Each condition must be satisfied
/// in order for the chain to pass; the first definitive failure fails the
/// whole chain.
pub struct Chain<V: Value> {
    conditions: Vec<Condition<V>>,
}

impl<V: Value> Chain<V> {
    pub(crate) fn new(conditions: Vec<Condition<V>>) -> Self {
        Self { conditions }
    }

    /// Returns the number of conditions in this chain.
    #[inline]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    #[inline]
    pub(crate) fn conditions(&self) -> &[Condition<V>] {
        &self.conditions
    }
}

impl<V: Value> fmt::Debug for Chain<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("conditions", &self.conditions)
            .finish()
    }
}

/// Fluent declaration of a chain on a recorder.
///
/// Created by [`Recorder::expect`]. Each step method appends one
/// condition; [`register`](Self::register) seals the chain and queues it
/// for the next round.
///
/// # Example
///
/// ```ignore
/// recorder.expect()
///     .one(equals("hello".to_string()))
///     .next(equals("world".to_string()))
///     .message("the greeting must be answered immediately")
///     .register()?;
/// ```
#[must_use = "a chain does nothing until register() is called"]
pub struct ChainBuilder<'a, V: Value> {
    recorder: &'a Recorder<V>,
    conditions: Vec<Condition<V>>,
}

impl<'a, V: Value> ChainBuilder<'a, V> {
    pub(crate) fn new(recorder: &'a Recorder<V>) -> Self {
        Self {
            recorder,
            conditions: Vec::new(),
        }
    }

    /// Append a condition satisfied by any later value ([`StepPolicy::One`]).
    pub fn one(mut self, predicate: Predicate<V>) -> Self {
        self.conditions
            .push(Condition::policy(StepPolicy::One, predicate));
        self
    }

    /// Append a condition that commits on the very next value
    /// ([`StepPolicy::Next`]).
    pub fn next(mut self, predicate: Predicate<V>) -> Self {
        self.conditions
            .push(Condition::policy(StepPolicy::Next, predicate));
        self
    }

    /// Append a condition checked against the final value at round end
    /// ([`StepPolicy::Last`]).
    pub fn last(mut self, predicate: Predicate<V>) -> Self {
        self.conditions
            .push(Condition::policy(StepPolicy::Last, predicate));
        self
    }

    /// Append a condition every remaining value must satisfy
    /// ([`StepPolicy::All`]).
    pub fn all(mut self, predicate: Predicate<V>) -> Self {
        self.conditions
            .push(Condition::policy(StepPolicy::All, predicate));
        self
    }

    /// Append a raw step function with the `(is_round_end, latest, all)`
    /// contract. See [`StepFn`](crate::StepFn).
    pub fn step<F>(mut self, step: F) -> Self
    where
        F: Fn(bool, Option<&V>, &[V]) -> StepOutcome + Send + Sync + 'static,
    {
        self.conditions.push(Condition::custom(step));
        self
    }

    /// Override the failure message of the condition appended last.
    ///
    /// Has no effect when no condition has been appended yet.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        if let Some(condition) = self.conditions.last_mut() {
            condition.set_message(message);
        }
        self
    }

    /// Seal the chain and queue it on the recorder for the next round.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyChain`] when no condition was appended.
    pub fn register(self) -> Result<()> {
        if self.conditions.is_empty() {
            return Err(Error::EmptyChain);
        }
        self.recorder.push_chain(Chain::new(self.conditions));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equals;

    #[test]
    fn builder_appends_conditions_in_order() {
        let recorder: Recorder<String> = Recorder::new("stream");
        recorder
            .expect()
            .one(equals("A".to_string()))
            .next(equals("B".to_string()))
            .last(equals("C".to_string()))
            .register()
            .unwrap();

        let chains = recorder.take_chains();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].len(), 3);
    }

    #[test]
    fn empty_chain_is_rejected() {
        let recorder: Recorder<String> = Recorder::new("stream");
        let result = recorder.expect().register();
        assert_eq!(result, Err(Error::EmptyChain));
    }

    #[test]
    fn message_attaches_to_the_last_condition() {
        let recorder: Recorder<String> = Recorder::new("stream");
        recorder
            .expect()
            .one(equals("A".to_string()))
            .message("expected the opening frame")
            .register()
            .unwrap();

        let chains = recorder.take_chains();
        let outcome = chains[0].conditions()[0].evaluate(true, None, &[]);
        assert_eq!(
            outcome.into_message().unwrap(),
            "expected the opening frame"
        );
    }

    #[test]
    fn chains_accumulate_until_taken() {
        let recorder: Recorder<String> = Recorder::new("stream");
        recorder
            .expect()
            .one(equals("A".to_string()))
            .register()
            .unwrap();
        recorder
            .expect()
            .one(equals("B".to_string()))
            .register()
            .unwrap();

        assert_eq!(recorder.take_chains().len(), 2);
        assert!(recorder.take_chains().is_empty());
    }
}
