//! Retry policy for upstream fetches.

use std::time::Duration;

use backon::ExponentialBuilder;

/// Initial backoff delay between attempts.
pub const INITIAL_BACKOFF_MS: u64 = 1_000;
/// Ceiling on the backoff delay.
pub const MAX_BACKOFF_MS: u64 = 60_000;
/// Default attempt budget per repository and cycle.
pub const DEFAULT_RETRY_BUDGET: u32 = 2;

/// Configuration for retrying a repository's fetch within one cycle.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Minimum delay between attempts.
    pub min_delay: Duration,
    /// Maximum delay between attempts.
    pub max_delay: Duration,
    /// Total attempts allowed, including the first. A budget of 1 means no
    /// retries.
    pub budget: u32,
    /// Whether to add jitter to delays.
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
            budget: DEFAULT_RETRY_BUDGET,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a retry configuration with the default delays and a custom
    /// attempt budget.
    #[must_use]
    pub fn with_budget(budget: u32) -> Self {
        Self {
            budget: budget.max(1),
            ..Self::default()
        }
    }

    /// Set whether to use jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Build an exponential backoff strategy from this configuration.
    ///
    /// backon counts retries after the first attempt, so the builder gets
    /// `budget - 1`.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let retries = self.budget.saturating_sub(1) as usize;
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}
