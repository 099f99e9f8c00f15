use crate::StreamId;

/// The single error type for all vigil operations.
///
/// Every fallible vigil API returns `vigil::Result<T>` (alias for
/// `Result<T, vigil::Error>`). The engine itself never raises a fatal
/// error during evaluation: an unsatisfied condition is a verdict, not an
/// `Error`. These variants cover declaration and transport-boundary
/// mistakes only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The transport appended a value to a stream it already closed.
    #[error("stream '{0}' is closed")]
    StreamClosed(StreamId),

    /// A chain was registered without any conditions.
    #[error("chain declared with no conditions")]
    EmptyChain,
}
