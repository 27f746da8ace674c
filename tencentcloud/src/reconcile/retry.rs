//! Bounded-retry loop with a wall-clock ceiling

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }
}

/// Outcome of one failed attempt as seen by the loop
#[derive(Debug)]
pub enum Attempt<E> {
    Retryable(E),
    NonRetryable(E),
}

#[derive(Debug)]
pub enum RetryError<E> {
    /// Only retryable errors were seen until the ceiling was reached
    Timeout {
        elapsed: Duration,
        attempts: u32,
        last: E,
    },
    /// The first non-retryable error, unchanged
    Permanent { error: E, attempts: u32 },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Timeout { attempts, .. } | RetryError::Permanent { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn into_inner(self) -> E {
        match self {
            RetryError::Timeout { last, .. } => last,
            RetryError::Permanent { error, .. } => error,
        }
    }
}

enum State<T, E> {
    Attempting,
    Succeeded(T),
    FailedTerminal(RetryError<E>),
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// `ceiling` has elapsed since the first attempt. Waits back off
/// exponentially and never sleeps past the ceiling, so the loop ends at most
/// one attempt's latency after it.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    ceiling: Duration,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Attempt<E>>>,
{
    let started = Instant::now();
    let mut backoff = policy.initial_backoff;
    let mut attempts = 0u32;
    let mut state = State::Attempting;

    loop {
        state = match state {
            State::Attempting => {
                attempts += 1;
                match operation().await {
                    Ok(value) => State::Succeeded(value),
                    Err(Attempt::NonRetryable(error)) => {
                        State::FailedTerminal(RetryError::Permanent { error, attempts })
                    }
                    Err(Attempt::Retryable(error)) => {
                        let elapsed = started.elapsed();
                        if elapsed >= ceiling {
                            State::FailedTerminal(RetryError::Timeout {
                                elapsed,
                                attempts,
                                last: error,
                            })
                        } else {
                            let wait = backoff.min(ceiling - elapsed);
                            tracing::debug!(
                                attempt = attempts,
                                wait_ms = wait.as_millis() as u64,
                                "retryable error: {}",
                                error
                            );
                            tokio::time::sleep(wait).await;
                            backoff = (backoff * 2).min(policy.max_backoff);
                            State::Attempting
                        }
                    }
                }
            }
            State::Succeeded(value) => return Ok(value),
            State::FailedTerminal(error) => return Err(error),
        };
    }
}
