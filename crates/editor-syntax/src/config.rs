//! Pipeline configuration.

use std::time::Duration;

/// Default quiet period after the last edit before a recomputation starts.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);

/// Default delay before the first computation after construction.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(10);

/// Configuration for a [`Pipeline`](crate::pipeline::Pipeline).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Quiet period after the last mutation before the worker runs.
    pub debounce: Duration,
    /// Delay used for the first computation only.
    pub initial_delay: Duration,
    /// Worker thread name. Pipelines append their computation name when this is `None`.
    pub thread_name: Option<String>,
}

impl PipelineConfig {
    /// Create a config with the default delays.
    ///
    /// By default:
    /// - `debounce` is 150 ms
    /// - `initial_delay` is 10 ms
    pub fn new() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            initial_delay: DEFAULT_INITIAL_DELAY,
            thread_name: None,
        }
    }

    /// Set the debounce delay.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Set the initial delay.
    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    /// Name the worker thread.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }

    /// Zero delays; useful for tests and batch tools.
    pub fn immediate() -> Self {
        Self::new()
            .with_debounce(Duration::ZERO)
            .with_initial_delay(Duration::ZERO)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}
