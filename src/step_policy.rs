use crate::condition::StepOutcome;
use crate::{Predicate, Value};

/// Controls when a condition is evaluated and how non-satisfaction is
/// scored.
///
/// Every policy answers the same three-way question — am I done, did I
/// pass, and with what message — for two kinds of events: a newly arrived
/// value, and the end of the round (deadline elapsed, stream closed, or an
/// early round end).
///
/// | Policy | New value | Round end |
/// |--------|-----------|-----------|
/// | [`One`](Self::One) | passes when satisfied, else keeps waiting | fails |
/// | [`Next`](Self::Next) | commits on the very first value | commits on the last value, or fails with none |
/// | [`Last`](Self::Last) | ignored | checks the final value; fails on an empty stream |
/// | [`All`](Self::All) | fails on the first violation | passes (vacuously with no values) |
///
/// Negated variants are expressed by feeding a negated predicate into
/// `One`/`All`, not by separate policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepPolicy {
    /// "Exists somewhere forward": satisfied by any later value; only the
    /// round ending can fail it.
    One,

    /// "Commits on the very next value": evaluated exactly once, against
    /// the first value that arrives after the condition becomes current.
    /// A wrong first value fails the chain immediately, even if a right
    /// one arrives later.
    Next,

    /// "True at closure": waits out the whole round and checks the most
    /// recent value. Fails when the round ends with no values at all,
    /// regardless of the predicate.
    Last,

    /// "True for every remaining value": the first violating value fails
    /// the chain immediately; a round that ends without violations passes,
    /// vacuously so if nothing arrived.
    All,
}

impl StepPolicy {
    /// Scores one event against `predicate`.
    ///
    /// `latest` is the value that just arrived (`None` only at round end,
    /// on a stream that never produced anything). `all` is the full
    /// history of the round so far, in arrival order.
    pub(crate) fn evaluate<V: Value>(
        &self,
        predicate: &Predicate<V>,
        is_round_end: bool,
        latest: Option<&V>,
        all: &[V],
    ) -> StepOutcome {
        match self {
            StepPolicy::One => {
                if is_round_end {
                    StepOutcome::fail(format!(
                        "no value satisfied `{}`{}",
                        predicate.description(),
                        last_seen(all)
                    ))
                } else {
                    match latest {
                        Some(value) if predicate.satisfied_by(value) => StepOutcome::pass(),
                        _ => StepOutcome::pending(),
                    }
                }
            }
            StepPolicy::Next => match latest {
                Some(value) if predicate.satisfied_by(value) => StepOutcome::pass(),
                Some(value) => StepOutcome::fail(format!(
                    "next value {value:?} did not satisfy `{}`",
                    predicate.description()
                )),
                None if is_round_end => StepOutcome::fail(format!(
                    "no value arrived for `{}`",
                    predicate.description()
                )),
                // A new-value event always carries a value; nothing to do.
                None => StepOutcome::pending(),
            },
            StepPolicy::Last => {
                if !is_round_end {
                    return StepOutcome::pending();
                }
                match all.last() {
                    Some(value) if predicate.satisfied_by(value) => StepOutcome::pass(),
                    Some(value) => StepOutcome::fail(format!(
                        "final value {value:?} did not satisfy `{}`",
                        predicate.description()
                    )),
                    None => StepOutcome::fail(format!(
                        "stream ended with no values for `{}`",
                        predicate.description()
                    )),
                }
            }
            StepPolicy::All => {
                if is_round_end {
                    return StepOutcome::pass();
                }
                match latest {
                    Some(value) if !predicate.satisfied_by(value) => StepOutcome::fail(format!(
                        "value {value:?} violated `{}`",
                        predicate.description()
                    )),
                    _ => StepOutcome::pending(),
                }
            }
        }
    }
}

fn last_seen<V: Value>(all: &[V]) -> String {
    match all.last() {
        Some(value) => format!(" (last value: {value:?})"),
        None => " (no values arrived)".to_string(),
    }
}
