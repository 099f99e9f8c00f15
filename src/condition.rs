use std::fmt;
use std::sync::Arc;

use crate::{Predicate, StepPolicy, Value};

/// The result of scoring one condition against one event.
///
/// `done == false` means the condition is still waiting and will see
/// further events; `done == true` settles it, with `passed` deciding
/// between advancing the chain and failing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    done: bool,
    passed: bool,
    message: Option<String>,
}

impl StepOutcome {
    /// The condition is not settled yet; keep feeding it events.
    pub fn pending() -> Self {
        Self {
            done: false,
            passed: false,
            message: None,
        }
    }

    /// The condition is satisfied; the chain advances.
    pub fn pass() -> Self {
        Self {
            done: true,
            passed: true,
            message: None,
        }
    }

    /// The condition is definitively unsatisfied; the chain fails.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            done: true,
            passed: false,
            message: Some(message.into()),
        }
    }

    #[inline]
    pub fn done(&self) -> bool {
        self.done
    }

    #[inline]
    pub fn passed(&self) -> bool {
        self.passed
    }

    /// Consumes the outcome, returning its failure message if any.
    pub fn into_message(self) -> Option<String> {
        self.message
    }
}

/// Signature of a raw step function: `(is_round_end, latest, all)`.
///
/// The escape hatch for conditions the built-in policies cannot express.
/// The closure receives exactly what a policy does and must uphold the
/// same contract; a malformed step function is the caller's
/// responsibility.
pub type StepFn<V> = Arc<dyn Fn(bool, Option<&V>, &[V]) -> StepOutcome + Send + Sync>;

enum Step<V: Value> {
    Policy {
        policy: StepPolicy,
        predicate: Predicate<V>,
    },
    Custom(StepFn<V>),
}

/// One step of a chain: a predicate paired with the policy that decides
/// when to evaluate it, or a raw step function.
///
/// Conditions are immutable once declared. They are built through
/// [`ChainBuilder`](crate::ChainBuilder), never directly.
pub struct Condition<V: Value> {
    step: Step<V>,
    /// Overrides the policy's default failure message when set.
    message: Option<String>,
}

impl<V: Value> Condition<V> {
    pub(crate) fn policy(policy: StepPolicy, predicate: Predicate<V>) -> Self {
        Self {
            step: Step::Policy { policy, predicate },
            message: None,
        }
    }

    pub(crate) fn custom<F>(step: F) -> Self
    where
        F: Fn(bool, Option<&V>, &[V]) -> StepOutcome + Send + Sync + 'static,
    {
        Self {
            step: Step::Custom(Arc::new(step)),
            message: None,
        }
    }

    pub(crate) fn set_message(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// Scores one event. Called by the owning job, never concurrently
    /// with itself.
    pub(crate) fn evaluate(&self, is_round_end: bool, latest: Option<&V>, all: &[V]) -> StepOutcome {
        let mut outcome = match &self.step {
            Step::Policy { policy, predicate } => {
                policy.evaluate(predicate, is_round_end, latest, all)
            }
            Step::Custom(step) => step(is_round_end, latest, all),
        };
        if outcome.done && !outcome.passed {
            if let Some(message) = &self.message {
                outcome.message = Some(message.clone());
            }
        }
        outcome
    }
}

impl<V: Value> fmt::Debug for Condition<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.step {
            Step::Policy { policy, predicate } => f
                .debug_struct("Condition")
                .field("policy", policy)
                .field("predicate", &predicate.description())
                .finish_non_exhaustive(),
            Step::Custom(_) => f
                .debug_struct("Condition")
                .field("policy", &"custom")
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equals;

    #[test]
    fn message_override_replaces_default_failure_text() {
        let mut condition = Condition::policy(StepPolicy::One, equals("B".to_string()));
        condition.set_message("expected the ack frame");

        let outcome = condition.evaluate(true, None, &[]);
        assert!(!outcome.passed());
        assert_eq!(outcome.into_message().unwrap(), "expected the ack frame");
    }

    #[test]
    fn message_override_leaves_passes_alone() {
        let mut condition = Condition::policy(StepPolicy::One, equals("B".to_string()));
        condition.set_message("expected the ack frame");

        let all = vec!["B".to_string()];
        let outcome = condition.evaluate(false, all.last(), &all);
        assert!(outcome.passed());
        assert_eq!(outcome.into_message(), None);
    }

    #[test]
    fn custom_step_drives_the_same_contract() {
        // Settles once three values have been seen.
        let condition = Condition::custom(|is_round_end, _latest, all: &[String]| {
            if all.len() >= 3 {
                StepOutcome::pass()
            } else if is_round_end {
                StepOutcome::fail("fewer than three values")
            } else {
                StepOutcome::pending()
            }
        });

        let two = vec!["A".to_string(), "B".to_string()];
        assert!(!condition.evaluate(false, two.last(), &two).done());

        let three = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert!(condition.evaluate(false, three.last(), &three).passed());

        let outcome = condition.evaluate(true, two.last(), &two);
        assert!(outcome.done());
        assert!(!outcome.passed());
    }
}
