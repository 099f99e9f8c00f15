use tokio_util::sync::CancellationToken;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::condition::Condition;
use crate::recorder::Signal;
use crate::round::ChainReport;
use crate::{Chain, Recorder, Value};

/// Terminal state of one chain after one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Passed,
    Failed,
}

impl Verdict {
    #[inline]
    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Passed => write!(f, "passed"),
            Verdict::Failed => write!(f, "failed"),
        }
    }
}

/// The runtime evaluator of one chain during one round.
///
/// A job owns a cursor into its chain and a private mailbox bound to the
/// recorder. It consumes arrivals strictly in append order, one at a
/// time — skipping or batching would break the single-evaluation
/// guarantee of the `Next` policy. The job task suspends only inside its
/// mailbox wait, racing arrivals against the round-end token.
pub(crate) struct Job<V: Value> {
    recorder: Recorder<V>,
    chain: Chain<V>,
    /// Position of this chain among those declared on the same recorder.
    index: usize,
    /// Monotonic; `cursor < chain.len()` whenever a condition is evaluated.
    cursor: usize,
    mailbox: UnboundedReceiver<Signal<V>>,
}

impl<V: Value> Job<V> {
    /// Binds a new job to its recorder. Called at round start.
    pub(crate) fn bind(recorder: &Recorder<V>, chain: Chain<V>, index: usize) -> Self {
        let mailbox = recorder.bind();
        Self {
            recorder: recorder.clone(),
            chain,
            index,
            cursor: 0,
            mailbox,
        }
    }

    /// Runs the job to its terminal state.
    ///
    /// Ends on the first of: the chain settling on an arrival, the stream
    /// closing, or `round_end` firing (deadline or fail-fast). On
    /// `round_end` the mailbox is drained first so values that arrived
    /// before the deadline are never lost to scheduling jitter.
    pub(crate) async fn run(mut self, round_end: CancellationToken) -> ChainReport {
        loop {
            tokio::select! {
                biased;
                _ = round_end.cancelled() => {
                    while let Ok(signal) = self.mailbox.try_recv() {
                        match signal {
                            Signal::Value(value) => {
                                if let Some(report) = self.on_value(&value) {
                                    return report;
                                }
                            }
                            Signal::Closed => break,
                        }
                    }
                    return self.on_round_end();
                }
                signal = self.mailbox.recv() => match signal {
                    Some(Signal::Value(value)) => {
                        if let Some(report) = self.on_value(&value) {
                            return report;
                        }
                    }
                    Some(Signal::Closed) | None => return self.on_round_end(),
                },
            }
        }
    }

    /// Feeds one arrival to the current condition. `Some` means terminal.
    fn on_value(&mut self, value: &V) -> Option<ChainReport> {
        let recorder = self.recorder.clone();
        let outcome = recorder.with_history(|all| {
            self.current().evaluate(false, Some(value), all)
        });

        if !outcome.done() {
            return None;
        }
        if !outcome.passed() {
            let position = self.cursor + 1;
            let message = outcome
                .into_message()
                .unwrap_or_else(|| "condition failed".to_string());
            return Some(self.finish(
                Verdict::Failed,
                Some(format!(
                    "condition {position}/{}: {message}",
                    self.chain.len()
                )),
            ));
        }

        self.cursor += 1;
        if self.cursor == self.chain.len() {
            // Whole chain satisfied; no need to wait for the deadline.
            return Some(self.finish(Verdict::Passed, None));
        }
        None
    }

    /// Final evaluation once the round is over for this job.
    fn on_round_end(&mut self) -> ChainReport {
        let recorder = self.recorder.clone();
        let outcome = recorder.with_history(|all| {
            self.current().evaluate(true, all.last(), all)
        });

        let on_final_condition = self.cursor + 1 == self.chain.len();
        if outcome.done() && outcome.passed() {
            if on_final_condition {
                return self.finish(Verdict::Passed, None);
            }
            // The current condition held, but the rest of the chain never
            // got a chance to run: scored as failure.
            let satisfied = self.cursor + 1;
            return self.finish(
                Verdict::Failed,
                Some(format!(
                    "round ended after {satisfied}/{} conditions were satisfied",
                    self.chain.len()
                )),
            );
        }

        let position = self.cursor + 1;
        let message = outcome.into_message().unwrap_or_else(|| {
            format!(
                "round ended after {}/{} conditions were satisfied",
                self.cursor,
                self.chain.len()
            )
        });
        self.finish(
            Verdict::Failed,
            Some(format!(
                "condition {position}/{}: {message}",
                self.chain.len()
            )),
        )
    }

    /// The condition under the cursor.
    fn current(&self) -> &Condition<V> {
        &self.chain.conditions()[self.cursor]
    }

    fn finish(&self, verdict: Verdict, message: Option<String>) -> ChainReport {
        tracing::debug!(
            stream = %self.recorder.id(),
            chain = self.index,
            %verdict,
            "job finished"
        );
        ChainReport::new(self.recorder.id().clone(), self.index, verdict, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equals;

    fn job(recorder: &Recorder<String>) -> Job<String> {
        let chain = recorder.take_chains().remove(0);
        Job::bind(recorder, chain, 0)
    }

    #[tokio::test]
    async fn satisfying_a_later_condition_first_does_not_advance_the_chain() {
        let recorder: Recorder<String> = Recorder::new("stream");
        recorder
            .expect()
            .one(equals("A".to_string()))
            .one(equals("B".to_string()))
            .register()
            .unwrap();
        let job = job(&recorder);
        let round_end = CancellationToken::new();
        let handle = tokio::spawn(job.run(round_end.clone()));

        // "B" satisfies the second condition, but the first is still
        // current; the chain must not skip ahead.
        recorder.append("B".to_string()).unwrap();
        recorder.append("A".to_string()).unwrap();
        round_end.cancel();

        let report = handle.await.unwrap();
        assert_eq!(report.verdict(), Verdict::Failed);
        assert!(report.message().unwrap().contains("== \"B\""));
    }

    #[tokio::test]
    async fn next_commits_on_the_first_arrival() {
        let recorder: Recorder<String> = Recorder::new("stream");
        recorder
            .expect()
            .next(equals("B".to_string()))
            .register()
            .unwrap();
        let job = job(&recorder);
        let handle = tokio::spawn(job.run(CancellationToken::new()));

        recorder.append("A".to_string()).unwrap();
        recorder.append("B".to_string()).unwrap();

        // Fails on "A" without waiting for any round-end signal.
        let report = handle.await.unwrap();
        assert_eq!(report.verdict(), Verdict::Failed);
        assert!(report.message().unwrap().contains("\"A\""));
    }

    #[tokio::test]
    async fn full_chain_passes_without_waiting_for_the_deadline() {
        let recorder: Recorder<String> = Recorder::new("stream");
        recorder
            .expect()
            .one(equals("A".to_string()))
            .one(equals("B".to_string()))
            .register()
            .unwrap();
        let job = job(&recorder);
        // Token never cancelled: termination must come from the values alone.
        let handle = tokio::spawn(job.run(CancellationToken::new()));

        recorder.append("A".to_string()).unwrap();
        recorder.append("B".to_string()).unwrap();

        let report = handle.await.unwrap();
        assert_eq!(report.verdict(), Verdict::Passed);
        assert_eq!(report.message(), None);
    }

    #[tokio::test]
    async fn values_queued_before_the_deadline_are_still_evaluated() {
        let recorder: Recorder<String> = Recorder::new("stream");
        recorder
            .expect()
            .one(equals("A".to_string()))
            .register()
            .unwrap();
        let chain = recorder.take_chains().remove(0);

        // Deliver the value and fire the deadline before the job task
        // ever polls its mailbox.
        let job = Job::bind(&recorder, chain, 0);
        recorder.append("A".to_string()).unwrap();
        let round_end = CancellationToken::new();
        round_end.cancel();

        let report = job.run(round_end).await;
        assert_eq!(report.verdict(), Verdict::Passed);
    }

    #[tokio::test]
    async fn forced_round_end_mid_chain_is_scored_failed() {
        let recorder: Recorder<String> = Recorder::new("stream");
        recorder
            .expect()
            .one(equals("A".to_string()))
            .one(equals("B".to_string()))
            .register()
            .unwrap();
        let job = job(&recorder);
        let handle = tokio::spawn(job.run(CancellationToken::new()));

        recorder.append("A".to_string()).unwrap();
        recorder.close();

        let report = handle.await.unwrap();
        assert_eq!(report.verdict(), Verdict::Failed);
        assert!(report.message().unwrap().contains("condition 2/2"));
    }
}
