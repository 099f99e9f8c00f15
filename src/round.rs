use std::fmt;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::job::Job;
use crate::report::{Reporter, TracingReporter};
use crate::{Config, ContextId, Recorder, Registry, StreamId, Value, Verdict};

/// One bounded-time evaluation of every chain declared since the
/// previous round boundary.
///
/// Starting a round spawns one evaluation job per pending chain and
/// blocks the caller until every job is terminal or the deadline has
/// forced the stragglers into their round-end evaluation. Afterwards
/// every participating recorder is reset, so the same recorder serves
/// the next act-assert cycle of the test.
///
/// Failed chains are pushed to the [`Reporter`]; passed chains report
/// nothing.
///
/// # Example
///
/// ```ignore
/// let report = Round::new(Duration::from_millis(100))
///     .run(&recorder)
///     .await;
/// assert!(report.passed());
/// ```
pub struct Round {
    deadline: Duration,
    fail_fast: bool,
    reporter: Arc<dyn Reporter>,
}

impl Round {
    /// Create a round with the given time budget.
    pub fn new(deadline: Duration) -> Self {
        Self {
            deadline,
            fail_fast: false,
            reporter: Arc::new(TracingReporter),
        }
    }

    /// Create a round from a [`Config`]'s defaults.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.default_deadline()).fail_fast(config.fail_fast())
    }

    /// End the whole round early on the first chain failure.
    ///
    /// Off by default: failures stay local to their chain, and sibling
    /// chains keep evaluating until they settle or the deadline fires.
    /// When enabled, the first failure cancels the round's end token,
    /// forcing every still-pending job into its round-end evaluation.
    pub fn fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }

    /// Replace the default [`TracingReporter`] failure sink.
    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Evaluate every chain declared on one recorder.
    ///
    /// Blocks until the round completes, then resets the recorder.
    pub async fn run<V: Value>(&self, recorder: &Recorder<V>) -> RoundReport {
        self.execute(std::slice::from_ref(recorder)).await
    }

    /// Evaluate every chain declared on every recorder registered under
    /// `context`.
    ///
    /// Blocks until the round completes, then resets all of them.
    pub async fn run_all<V: Value>(&self, registry: &Registry<V>, context: &ContextId) -> RoundReport {
        let recorders = registry.recorders(context);
        self.execute(&recorders).await
    }

    async fn execute<V: Value>(&self, recorders: &[Recorder<V>]) -> RoundReport {
        let round_end = CancellationToken::new();
        let mut jobs: JoinSet<ChainReport> = JoinSet::new();

        for recorder in recorders {
            for (index, chain) in recorder.take_chains().into_iter().enumerate() {
                let job = Job::bind(recorder, chain, index);
                let token = round_end.clone();
                jobs.spawn(job.run(token));
            }
        }
        tracing::debug!(
            chains = jobs.len(),
            deadline = ?self.deadline,
            fail_fast = self.fail_fast,
            "round started"
        );

        let timer = {
            let token = round_end.clone();
            let deadline = self.deadline;
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                token.cancel();
            })
        };

        let mut chains = Vec::with_capacity(jobs.len());
        while let Some(joined) = jobs.join_next().await {
            match joined {
                Ok(report) => {
                    if !report.passed() {
                        self.reporter.report(&report.to_string());
                        if self.fail_fast {
                            round_end.cancel();
                        }
                    }
                    chains.push(report);
                }
                Err(error) => {
                    // A job only panics out of a malformed custom step;
                    // that chain's verdict is lost, the round carries on.
                    tracing::error!(%error, "evaluation job panicked");
                }
            }
        }
        timer.abort();

        for recorder in recorders {
            recorder.reset();
        }

        let report = RoundReport { chains };
        tracing::debug!(
            chains = report.chains.len(),
            failed = report.failures().count(),
            "round finished"
        );
        report
    }
}

impl Default for Round {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl fmt::Debug for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Round")
            .field("deadline", &self.deadline)
            .field("fail_fast", &self.fail_fast)
            .finish_non_exhaustive()
    }
}

/// Terminal state of one chain after a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainReport {
    stream: StreamId,
    chain: usize,
    verdict: Verdict,
    message: Option<String>,
}

impl ChainReport {
    pub(crate) fn new(
        stream: StreamId,
        chain: usize,
        verdict: Verdict,
        message: Option<String>,
    ) -> Self {
        Self {
            stream,
            chain,
            verdict,
            message,
        }
    }

    /// The stream this chain watched.
    #[inline]
    pub fn stream(&self) -> &StreamId {
        &self.stream
    }

    /// Position of the chain among those declared on the same recorder.
    #[inline]
    pub fn chain(&self) -> usize {
        self.chain
    }

    #[inline]
    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// The failure message; `None` for passed chains.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[inline]
    pub fn passed(&self) -> bool {
        self.verdict.passed()
    }
}

impl fmt::Display for ChainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "stream '{}' chain {} {}",
            self.stream, self.chain, self.verdict
        )?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

/// The verdicts of one completed round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    chains: Vec<ChainReport>,
}

impl RoundReport {
    /// Returns true when every chain passed (vacuously for an empty round).
    pub fn passed(&self) -> bool {
        self.chains.iter().all(ChainReport::passed)
    }

    /// Per-chain verdicts, in completion order.
    pub fn chains(&self) -> &[ChainReport] {
        &self.chains
    }

    /// The chains that failed.
    pub fn failures(&self) -> impl Iterator<Item = &ChainReport> {
        self.chains.iter().filter(|chain| !chain.passed())
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl fmt::Display for RoundReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed = self.failures().count();
        write!(
            f,
            "{} chains: {} passed, {} failed",
            self.chains.len(),
            self.chains.len() - failed,
            failed
        )
    }
}
