//! Retry policy for remote operations
//!
//! The same policy type is applied at two independent layers: connection
//! establishment, where an `Err` is what gets retried, and address
//! discovery, where an empty answer is. [`RetryPolicy::retry`] covers the
//! first case; [`RetryPolicy::schedule`] gives callers an attempt loop they
//! drive themselves for the second.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::serde_utils::duration_secs;

/// Attempt budget and delay between attempts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of attempts; 0 is treated as 1
    pub attempts: u32,

    /// Delay after the first failed attempt
    #[serde(with = "duration_secs")]
    pub delay: Duration,

    /// Growth factor applied to the delay after each failure
    pub multiplier: f64,

    /// Upper bound for the delay
    #[serde(with = "duration_secs")]
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(1),
            multiplier: 1.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Fixed delay between a fixed number of attempts
    pub fn fixed(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts,
            delay,
            ..Self::default()
        }
    }

    /// Effective attempt count
    pub fn max_attempts(&self) -> u32 {
        self.attempts.max(1)
    }

    /// Start an attempt loop driven by the caller
    pub fn schedule(&self) -> RetrySchedule {
        RetrySchedule {
            backoff: Backoff::new(self.delay, self.max_delay, self.multiplier),
            attempts: self.max_attempts(),
            attempt: 0,
        }
    }

    /// Run `op` until it succeeds or the budget is spent
    ///
    /// Errors from all but the last attempt are logged and swallowed; the
    /// last attempt's result is returned unchanged. `op` receives the
    /// 1-based attempt number.
    pub async fn retry<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let attempts = self.max_attempts();
        let mut backoff = Backoff::new(self.delay, self.max_delay, self.multiplier);

        for attempt in 1..attempts {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    let delay = backoff.next_delay();
                    tracing::warn!(
                        "Attempt {}/{} failed: {}. Retrying in {:?}",
                        attempt,
                        attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        op(attempts).await
    }
}

/// Caller-driven attempt loop produced by [`RetryPolicy::schedule`]
///
/// ```ignore
/// let mut schedule = policy.schedule();
/// while let Some(attempt) = schedule.next().await {
///     if let Some(found) = query().await? {
///         return Ok(found);
///     }
/// }
/// ```
#[derive(Debug)]
pub struct RetrySchedule {
    backoff: Backoff,
    attempts: u32,
    attempt: u32,
}

impl RetrySchedule {
    /// Wait for the next attempt and return its 1-based number
    ///
    /// The first call returns immediately. Later calls sleep for the
    /// current delay first. Returns `None` once the budget is spent,
    /// without sleeping.
    pub async fn next(&mut self) -> Option<u32> {
        if self.attempt >= self.attempts {
            return None;
        }
        if self.attempt > 0 {
            tokio::time::sleep(self.backoff.next_delay()).await;
        }
        self.attempt += 1;
        Some(self.attempt)
    }

    /// Attempts started so far
    pub fn attempts_made(&self) -> u32 {
        self.attempt
    }
}

/// Multiplicative backoff between attempts
#[derive(Debug, Clone)]
struct Backoff {
    current: Duration,
    max: Duration,
    multiplier: f64,
}

impl Backoff {
    fn new(initial: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            current: std::cmp::min(initial, max),
            max,
            multiplier,
        }
    }

    /// Get the next delay and advance the backoff
    ///
    /// Growth saturates at `max`, including for multipliers too large to
    /// represent as a `Duration`.
    fn next_delay(&mut self) -> Duration {
        let delay = self.current;

        if self.current < self.max {
            let scaled = self.current.as_secs_f64() * self.multiplier.max(1.0);
            self.current = Duration::try_from_secs_f64(scaled)
                .map_or(self.max, |next| std::cmp::min(next, self.max));
        }

        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::time::Instant;

    #[test]
    fn test_backoff_fixed_by_default() {
        let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(60), 1.0);
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let mut backoff = Backoff::new(Duration::from_secs(30), Duration::from_secs(60), 2.0);
        assert_eq!(backoff.next_delay(), Duration::from_secs(30));
        assert_eq!(backoff.next_delay(), Duration::from_secs(60));
        assert_eq!(backoff.next_delay(), Duration::from_secs(60));
    }

    #[test]
    fn test_backoff_huge_multiplier_saturates() {
        let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(60), 1e20);
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(60));

        let mut backoff =
            Backoff::new(Duration::from_secs(1), Duration::from_secs(60), f64::INFINITY);
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_with_configured_huge_multiplier() {
        for toml_text in [
            "attempts = 3\ndelay = 1\nmultiplier = 1e20",
            "attempts = 3\ndelay = 1\nmultiplier = inf",
        ] {
            let policy: RetryPolicy = toml::from_str(toml_text).unwrap();
            let calls = Cell::new(0);
            let start = Instant::now();

            let result: Result<(), &str> = policy
                .retry(|_| {
                    calls.set(calls.get() + 1);
                    async { Err("unreachable host") }
                })
                .await;

            assert_eq!(result, Err("unreachable host"));
            assert_eq!(calls.get(), 3);
            // 1s, then capped at the default 60s max_delay
            assert_eq!(start.elapsed(), Duration::from_secs(61));
        }
    }

    #[test]
    fn test_subsecond_delay_survives_toml() {
        let policy = RetryPolicy::fixed(2, Duration::from_millis(500));
        let text = toml::to_string(&policy).unwrap();
        assert!(text.contains("delay = 0.5"));

        let loaded: RetryPolicy = toml::from_str(&text).unwrap();
        assert_eq!(loaded, policy);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_returns_first_success() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::default();

        let result: Result<u32, String> = policy
            .retry(|attempt| {
                calls.set(calls.get() + 1);
                async move {
                    if attempt < 3 {
                        Err(format!("attempt {} failed", attempt))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausted_returns_last_error() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::default();
        let start = Instant::now();

        let result: Result<(), String> = policy
            .retry(|attempt| {
                calls.set(calls.get() + 1);
                async move { Err(format!("failure {}", attempt)) }
            })
            .await;

        assert_eq!(result, Err("failure 5".to_string()));
        assert_eq!(calls.get(), 5);
        // Four delays between five attempts, none after the last
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_runs_once() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::fixed(0, Duration::from_secs(1));

        let _: Result<(), &str> = policy
            .retry(|_| {
                calls.set(calls.get() + 1);
                async { Err("nope") }
            })
            .await;

        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_yields_every_attempt() {
        let policy = RetryPolicy::fixed(3, Duration::from_secs(2));
        let mut schedule = policy.schedule();
        let start = Instant::now();

        let mut seen = Vec::new();
        while let Some(attempt) = schedule.next().await {
            seen.push((attempt, start.elapsed()));
        }

        assert_eq!(
            seen,
            vec![
                (1, Duration::ZERO),
                (2, Duration::from_secs(2)),
                (3, Duration::from_secs(4)),
            ]
        );
        assert_eq!(schedule.attempts_made(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }
}
