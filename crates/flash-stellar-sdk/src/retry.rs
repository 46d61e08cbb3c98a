//! Backoff for Soroban RPC requests that never reached the node.
//!
//! A JSON-RPC request is repeated only when the transport failed or the
//! HTTP layer answered 408, 429 or 5xx. Anything the node actually
//! answered, an RPC error object included, goes straight back to the caller.
//! `sendTransaction` shares the same backoff under a narrower predicate: it
//! is repeated only when the connection could not be made, since a
//! timed-out submission may already be in the mempool. Polling for the
//! outcome has its own policy in [`crate::transaction::submit`].
//!
//! ```rust
//! use flash_stellar_sdk::retry::RetryConfig;
//! use flash_stellar_sdk::StellarConfig;
//! use std::time::Duration;
//!
//! let retry = RetryConfig::builder()
//!     .max_retries(4)
//!     .initial_delay_ms(250)
//!     .jitter(false)
//!     .build();
//! assert_eq!(retry.delay_for_attempt(3), Duration::from_millis(1_000));
//!
//! let config = StellarConfig::testnet().with_retry(retry);
//! assert_eq!(config.retry_config().max_retries(), 4);
//! ```

use crate::error::{StellarError, StellarResult};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// How often, and how patiently, a failed RPC request is repeated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl Default for RetryConfig {
    /// Three retries starting at 100ms, capped at 10s, jittered.
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Starts from the defaults.
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder {
            config: Self::default(),
        }
    }

    /// Every request is sent exactly once.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Slower backoff for shared public endpoints, which rate limit hard.
    pub fn conservative() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            ..Self::default()
        }
    }

    /// Retries allowed after the first attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before the first retry.
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Upper bound on any single delay.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Whether delays are randomized.
    pub fn jitter(&self) -> bool {
        self.jitter
    }

    /// Pause before retry number `attempt` (1-based; 0 is the first send).
    ///
    /// The delay doubles per retry up to [`max_delay`](Self::max_delay).
    /// With jitter on, the upper half of the delay is randomized so that
    /// clients backing off from the same outage spread out.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        let delay = self.initial_delay.saturating_mul(factor).min(self.max_delay);
        if !self.jitter || delay.is_zero() {
            return delay;
        }
        let half = delay / 2;
        half + rand::thread_rng().gen_range(Duration::ZERO..=half)
    }

    /// Whether `error` is a transport failure worth repeating.
    pub fn is_retryable_error(&self, error: &StellarError) -> bool {
        self.max_retries > 0 && error.is_retryable()
    }
}

/// Consuming builder for [`RetryConfig`].
#[derive(Debug, Clone)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    /// Retries allowed after the first attempt.
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Delay before the first retry, in milliseconds.
    #[must_use]
    pub fn initial_delay_ms(mut self, millis: u64) -> Self {
        self.config.initial_delay = Duration::from_millis(millis);
        self
    }

    /// Cap on any single delay, in milliseconds.
    #[must_use]
    pub fn max_delay_ms(mut self, millis: u64) -> Self {
        self.config.max_delay = Duration::from_millis(millis);
        self
    }

    /// Turns delay randomization on or off.
    #[must_use]
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.config.jitter = jitter;
        self
    }

    /// Finishes the config. A cap below the initial delay is raised to it.
    pub fn build(self) -> RetryConfig {
        let mut config = self.config;
        config.max_delay = config.max_delay.max(config.initial_delay);
        config
    }
}

/// Repeats a request future until it succeeds or the budget runs out.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    /// Wraps a retry budget.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Runs `request`, repeating it while `should_retry` accepts the error.
    ///
    /// `request` is called once per attempt, so each attempt builds a fresh
    /// future (and, for JSON-RPC, a fresh request id). The last error is
    /// returned once the budget is spent.
    pub async fn execute_with_predicate<F, Fut, T, P>(
        &self,
        request: F,
        should_retry: P,
    ) -> StellarResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = StellarResult<T>>,
        P: Fn(&StellarError) -> bool,
    {
        let mut retries = 0;
        loop {
            let error = match request().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            if !should_retry(&error) {
                return Err(error);
            }
            if retries == self.config.max_retries {
                warn!(retries, error = %error, "RPC retry budget exhausted");
                return Err(error);
            }
            retries += 1;
            let delay = self.config.delay_for_attempt(retries);
            debug!(
                retry = retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "Transient RPC failure, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
