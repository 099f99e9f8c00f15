use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::{Chain, ChainBuilder, Error, Result, StreamId, Value};

/// What a job's mailbox carries: either one appended value or the
/// stream-closure sentinel.
///
/// Closure travels in-band, behind every value appended before it, so a
/// job can never observe the stream as closed while appended values are
/// still queued for it.
pub(crate) enum Signal<V> {
    Value(V),
    Closed,
}

/// The per-stream buffer and fanout point for observed values.
///
/// A `Recorder` stands between the simulated transport and the evaluation
/// engine: the transport [`append`](Self::append)s every outbound value
/// and [`close`](Self::close)s the stream at most once; chains are
/// declared against the recorder via [`expect`](Self::expect) and
/// evaluated by a [`Round`](crate::Round).
///
/// History is append-only and shared read-only with every evaluation job,
/// so all jobs bound to one recorder observe the identical growing
/// sequence. History and job bindings are reset at round boundaries; the
/// same recorder serves any number of consecutive rounds.
///
/// `Recorder` is cheap to clone; clones share the same stream.
///
/// # Example
///
/// ```ignore
/// let recorder: Recorder<String> = Recorder::new("server");
/// recorder.expect().one(equals("hello".to_string())).register()?;
///
/// recorder.append("hello".to_string())?;
/// recorder.close();
/// ```
pub struct Recorder<V: Value> {
    inner: Arc<Inner<V>>,
}

struct Inner<V: Value> {
    id: StreamId,
    /// Written only by the producer side (`append`/`reset`); jobs read.
    history: RwLock<Vec<V>>,
    closed: AtomicBool,
    /// Chains declared since the last round boundary.
    pending: Mutex<Vec<Chain<V>>>,
    /// Mailbox senders of the jobs bound for the current round.
    mailboxes: Mutex<Vec<UnboundedSender<Signal<V>>>>,
}

impl<V: Value> Clone for Recorder<V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<V: Value> Recorder<V> {
    /// Create a recorder for one simulated stream.
    pub fn new(id: impl Into<StreamId>) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: id.into(),
                history: RwLock::new(Vec::new()),
                closed: AtomicBool::new(false),
                pending: Mutex::new(Vec::new()),
                mailboxes: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Returns the stream name.
    #[inline]
    pub fn id(&self) -> &StreamId {
        &self.inner.id
    }

    /// Start declaring a chain against this stream.
    pub fn expect(&self) -> ChainBuilder<'_, V> {
        ChainBuilder::new(self)
    }

    /// Record one emitted value and notify every bound job.
    ///
    /// The history push is synchronous; fanout goes through unbounded
    /// per-job mailboxes, so a slow or not-yet-started job can never
    /// stall the producer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StreamClosed`] when called after [`close`](Self::close).
    pub fn append(&self, value: V) -> Result<()> {
        if self.is_closed() {
            return Err(Error::StreamClosed(self.inner.id.clone()));
        }
        // The mailbox lock spans the history push so a concurrently
        // binding job sees the value exactly once: in its replay, or in
        // this fanout, never both.
        let mut mailboxes = lock(&self.inner.mailboxes);
        write(&self.inner.history).push(value.clone());
        mailboxes.retain(|mailbox| mailbox.send(Signal::Value(value.clone())).is_ok());
        Ok(())
    }

    /// Mark the stream as ended. One-shot; later calls are no-ops.
    ///
    /// Every bound job observes closure exactly once, after all values
    /// appended before it.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::debug!(stream = %self.inner.id, "stream closed");
        let mut mailboxes = lock(&self.inner.mailboxes);
        mailboxes.retain(|mailbox| mailbox.send(Signal::Closed).is_ok());
    }

    /// Returns true once the stream has been closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Returns the number of values recorded in the current round.
    pub fn value_count(&self) -> usize {
        read(&self.inner.history).len()
    }

    pub(crate) fn push_chain(&self, chain: Chain<V>) {
        lock(&self.inner.pending).push(chain);
    }

    /// Drains every chain declared since the previous round boundary.
    pub(crate) fn take_chains(&self) -> Vec<Chain<V>> {
        std::mem::take(&mut *lock(&self.inner.pending))
    }

    /// Opens a mailbox for a job, replaying values already buffered this
    /// round so chains see emissions from before the round started. On an
    /// already-closed stream the closure sentinel follows the replay.
    pub(crate) fn bind(&self) -> UnboundedReceiver<Signal<V>> {
        let (sender, receiver) = unbounded_channel();
        let mut mailboxes = lock(&self.inner.mailboxes);
        for value in read(&self.inner.history).iter() {
            let _ = sender.send(Signal::Value(value.clone()));
        }
        if self.is_closed() {
            let _ = sender.send(Signal::Closed);
        }
        mailboxes.push(sender);
        receiver
    }

    /// Runs `f` against the history under the read lock.
    pub(crate) fn with_history<R>(&self, f: impl FnOnce(&[V]) -> R) -> R {
        f(&read(&self.inner.history))
    }

    /// Clears history and drops job bindings at the round boundary.
    ///
    /// The closed flag survives: closure is terminal for the stream, not
    /// for the round.
    pub(crate) fn reset(&self) {
        write(&self.inner.history).clear();
        lock(&self.inner.mailboxes).clear();
        tracing::trace!(stream = %self.inner.id, "recorder reset");
    }
}

impl<V: Value> std::fmt::Debug for Recorder<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("id", &self.inner.id)
            .field("values", &self.value_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

// Lock helpers that survive poisoning: a panicking producer must not take
// every later round down with it.

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_records_history_in_arrival_order() {
        let recorder: Recorder<String> = Recorder::new("stream");
        recorder.append("A".to_string()).unwrap();
        recorder.append("B".to_string()).unwrap();

        assert_eq!(recorder.value_count(), 2);
        recorder.with_history(|all| {
            assert_eq!(all, ["A".to_string(), "B".to_string()]);
        });
    }

    #[tokio::test]
    async fn bound_jobs_see_values_then_closure_in_order() {
        let recorder: Recorder<String> = Recorder::new("stream");
        let mut mailbox = recorder.bind();

        recorder.append("A".to_string()).unwrap();
        recorder.append("B".to_string()).unwrap();
        recorder.close();

        assert!(matches!(mailbox.recv().await, Some(Signal::Value(v)) if v == "A"));
        assert!(matches!(mailbox.recv().await, Some(Signal::Value(v)) if v == "B"));
        assert!(matches!(mailbox.recv().await, Some(Signal::Closed)));
    }

    #[tokio::test]
    async fn binding_replays_values_buffered_before_the_job_existed() {
        let recorder: Recorder<String> = Recorder::new("stream");
        recorder.append("A".to_string()).unwrap();
        recorder.append("B".to_string()).unwrap();

        let mut mailbox = recorder.bind();
        recorder.append("C".to_string()).unwrap();

        assert!(matches!(mailbox.recv().await, Some(Signal::Value(v)) if v == "A"));
        assert!(matches!(mailbox.recv().await, Some(Signal::Value(v)) if v == "B"));
        assert!(matches!(mailbox.recv().await, Some(Signal::Value(v)) if v == "C"));
    }

    #[tokio::test]
    async fn binding_after_close_delivers_the_sentinel_immediately() {
        let recorder: Recorder<String> = Recorder::new("stream");
        recorder.close();

        let mut mailbox = recorder.bind();
        assert!(matches!(mailbox.recv().await, Some(Signal::Closed)));
    }

    #[tokio::test]
    async fn append_after_close_is_an_error() {
        let recorder: Recorder<String> = Recorder::new("stream");
        recorder.close();

        let result = recorder.append("A".to_string());
        assert_eq!(result, Err(Error::StreamClosed(recorder.id().clone())));
    }

    #[tokio::test]
    async fn close_is_one_shot() {
        let recorder: Recorder<String> = Recorder::new("stream");
        let mut mailbox = recorder.bind();

        recorder.close();
        recorder.close();

        assert!(matches!(mailbox.recv().await, Some(Signal::Closed)));
        // The second close must not queue a second sentinel.
        assert!(mailbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn reset_clears_history_and_bindings_but_not_closure() {
        let recorder: Recorder<String> = Recorder::new("stream");
        let _mailbox = recorder.bind();
        recorder.append("A".to_string()).unwrap();
        recorder.close();

        recorder.reset();

        assert_eq!(recorder.value_count(), 0);
        assert!(recorder.is_closed());
    }
}
