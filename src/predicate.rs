//! Predicates over observed values.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::Serialize;

use crate::Value;

type TestFn<V> = Arc<dyn Fn(&V) -> bool + Send + Sync>;

/// A pure boolean test over a single value.
///
/// Predicates are the leaves of every condition: side-effect-free closures
/// safely callable from any number of evaluation tasks at once. Build them
/// with the combinators in this module:
///
/// - [`equals`] — value-level equality
/// - [`contains`] — substring test against the value's text
/// - [`matches`] — regular-expression test against the value's text
/// - [`Predicate::custom`] — any closure, with a label for failure messages
/// - [`not`] / [`Predicate::negate`] — logical negation
///
/// # Example
///
/// ```ignore
/// use vigil::{contains, equals, not};
///
/// let greeting = equals("hello".to_string());
/// let no_errors = not(contains("error"));
/// ```
pub struct Predicate<V: Value> {
    test: TestFn<V>,
    description: Cow<'static, str>,
}

impl<V: Value> Clone for Predicate<V> {
    fn clone(&self) -> Self {
        Self {
            test: self.test.clone(),
            description: self.description.clone(),
        }
    }
}

impl<V: Value> fmt::Debug for Predicate<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl<V: Value> Predicate<V> {
    /// Build a predicate from an arbitrary closure.
    ///
    /// The description appears in failure messages, so name what the
    /// closure checks, not how.
    pub fn custom<F>(description: impl Into<Cow<'static, str>>, test: F) -> Self
    where
        F: Fn(&V) -> bool + Send + Sync + 'static,
    {
        Self {
            test: Arc::new(test),
            description: description.into(),
        }
    }

    /// Returns the logical negation of this predicate.
    pub fn negate(self) -> Self {
        let description = format!("not ({})", self.description);
        let test = self.test;
        Self {
            test: Arc::new(move |value| !(test)(value)),
            description: description.into(),
        }
    }

    /// Returns the human-readable description used in failure messages.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Applies the predicate to a value.
    pub(crate) fn satisfied_by(&self, value: &V) -> bool {
        (self.test)(value)
    }
}

/// Logical negation of a predicate.
///
/// Negated variants of `One`/`All` conditions are expressed by negating
/// the predicate; there is no separate negated policy.
pub fn not<V: Value>(predicate: Predicate<V>) -> Predicate<V> {
    predicate.negate()
}

/// Matches values equal to `target`.
pub fn equals<V: Value + PartialEq>(target: V) -> Predicate<V> {
    let description = format!("== {target:?}");
    Predicate::custom(description, move |value: &V| *value == target)
}

/// Matches values whose text contains `needle`.
///
/// Textual values ([`Value::as_text`]) are tested directly; any other
/// value is canonically serialized to JSON first. A value that cannot be
/// serialized never matches.
pub fn contains<V: Value + Serialize>(needle: impl Into<String>) -> Predicate<V> {
    let needle = needle.into();
    let description = format!("contains {needle:?}");
    Predicate::custom(description, move |value: &V| {
        with_text(value, |text| text.contains(&needle))
    })
}

/// Matches values whose text matches the regular expression `pattern`.
///
/// Uses the same text-or-serialize fallback as [`contains`]. An invalid
/// pattern yields a predicate that never matches (logged once at
/// construction); predicate evaluation itself cannot fail.
pub fn matches<V: Value + Serialize>(pattern: &str) -> Predicate<V> {
    let description = format!("matches /{pattern}/");
    let regex = match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(error) => {
            tracing::warn!(pattern, %error, "invalid pattern, predicate will never match");
            None
        }
    };
    Predicate::custom(description, move |value: &V| match &regex {
        Some(regex) => with_text(value, |text| regex.is_match(text)),
        None => false,
    })
}

/// Runs `f` against the value's canonical text.
///
/// Serialization failure is scored as a non-match, never an error.
fn with_text<V: Value + Serialize>(value: &V, f: impl Fn(&str) -> bool) -> bool {
    match value.as_text() {
        Some(text) => f(text),
        None => match serde_json::to_string(value) {
            Ok(json) => f(&json),
            Err(_) => false,
        },
    }
}
