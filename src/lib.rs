//! # Vigil
//!
//! Declarative condition-chain assertions over asynchronously produced
//! value streams, for Tokio test harnesses.
//!
//! Vigil buffers the values a system under test emits into per-stream
//! [`Recorder`]s, evaluates ordered chains of conditions against those
//! buffers concurrently, and races every chain against a deadline and the
//! stream's closure — producing reproducible pass/fail verdicts with
//! precise ordering semantics.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use vigil::{equals, Recorder, Round};
//!
//! #[tokio::main]
//! async fn main() -> vigil::Result {
//!     let recorder: Recorder<String> = Recorder::new("server");
//!
//!     // Declare what the stream must do.
//!     recorder.expect()
//!         .one(equals("hello".to_string()))
//!         .next(equals("world".to_string()))
//!         .register()?;
//!
//!     // The transport under test drives the recorder.
//!     recorder.append("hello".to_string())?;
//!     recorder.append("world".to_string())?;
//!     recorder.close();
//!
//!     // Evaluate everything declared so far, under a time budget.
//!     let report = Round::new(Duration::from_millis(100)).run(&recorder).await;
//!     assert!(report.passed());
//!     Ok(())
//! }
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Value`] | Marker trait for observed stream values |
//! | [`Recorder`] | Per-stream buffer and fanout point |
//! | [`Predicate`] | Pure boolean test over one value (see [`equals`], [`contains`], [`matches`], [`not`]) |
//! | [`StepPolicy`] | When a condition is evaluated: `One`, `Next`, `Last`, `All` |
//! | [`ChainBuilder`] | Fluent declaration of a condition chain |
//! | [`Round`] | One bounded-time evaluation of all declared chains |
//! | [`Registry`] | Context-keyed table of recorders for batch rounds |
//! | [`Reporter`] | External sink receiving failure messages |
//!
//! ## Step Policies
//!
//! Each condition in a chain carries a policy deciding when it is
//! evaluated and how non-satisfaction is scored:
//!
//! - **One** — satisfied by any later value; only the round ending fails it.
//! - **Next** — commits on the very next value: a wrong first value fails
//!   immediately, even if a right one follows.
//! - **Last** — checked against the final value once the round ends.
//! - **All** — every remaining value must satisfy it; the first violation
//!   fails immediately.
//!
//! Negations go through [`not`]; anything else through
//! [`ChainBuilder::step`].
//!
//! ## Rounds
//!
//! [`Round::run`] (or [`Round::run_all`] across a [`Registry`] context)
//! spawns one evaluation job per declared chain, then blocks until every
//! job settles or the deadline forces the round-end evaluation. Chains
//! settle early where they can: a fully satisfied chain passes without
//! waiting out the deadline, and a definitive violation fails on the
//! spot. Afterwards the recorders are reset for the next act-assert
//! cycle. Failures end up at the [`Reporter`]; passes are silent.

mod chain;
mod condition;
mod config;
mod context_id;
mod error;
mod job;
mod predicate;
mod recorder;
mod registry;
mod report;
mod round;
mod step_policy;
mod stream_id;
mod value;

pub use chain::{Chain, ChainBuilder};
pub use condition::{Condition, StepFn, StepOutcome};
pub use config::Config;
pub use context_id::ContextId;
pub use error::Error;
pub use job::Verdict;
pub use predicate::{contains, equals, matches, not, Predicate};
pub use recorder::Recorder;
pub use registry::Registry;
pub use report::{Reporter, TracingReporter};
pub use round::{ChainReport, Round, RoundReport};
pub use step_policy::StepPolicy;
pub use stream_id::StreamId;
pub use value::Value;

/// Convenience alias for `Result<T, vigil::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;
