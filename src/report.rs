/// Sink for chain-failure messages.
///
/// The one outbound call the engine makes: when a chain fails, its
/// message is pushed here — typically into the surrounding test
/// framework's failure reporting. Passed chains report nothing.
///
/// Implementations must be callable from any evaluation task.
pub trait Reporter: Send + Sync {
    fn report(&self, message: &str);
}

/// Default sink: logs every failure at error level.
///
/// Useful when the caller inspects the
/// [`RoundReport`](crate::RoundReport) directly and only wants failures
/// to show up in the log stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, message: &str) {
        tracing::error!("{message}");
    }
}
