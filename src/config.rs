use tokio::time::Duration;

/// Runtime configuration for rounds.
///
/// Controls the defaults a [`Round`](crate::Round) built via
/// [`Round::from_config`](crate::Round::from_config) starts from. Use the
/// builder pattern to customize, or use [`Default`] for sensible defaults.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use vigil::Config;
///
/// let config = Config::default()
///     .with_default_deadline(Duration::from_millis(250))
///     .with_fail_fast(true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Config {
    /// Time budget a round grants its jobs before forcing the round-end
    /// evaluation on everything still pending.
    /// Default: 1s
    default_deadline: Duration,

    /// Whether a single failing chain ends the whole round early.
    /// Default: false (failures stay local to their chain)
    fail_fast: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_deadline: Duration::from_secs(1),
            fail_fast: false,
        }
    }
}

impl Config {
    /// Set the default round deadline.
    pub fn with_default_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline = deadline;
        self
    }

    /// Returns the default round deadline.
    pub fn default_deadline(&self) -> Duration {
        self.default_deadline
    }

    /// Set whether rounds end early on the first chain failure.
    ///
    /// See [`Round::fail_fast`](crate::Round::fail_fast) for the semantics.
    pub fn with_fail_fast(mut self, enabled: bool) -> Self {
        self.fail_fast = enabled;
        self
    }

    /// Returns whether rounds end early on the first chain failure.
    pub fn fail_fast(&self) -> bool {
        self.fail_fast
    }
}
