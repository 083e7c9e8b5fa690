//! Retry utilities for fetch and extraction
//!
//! Every attempt runs under its own deadline. Retries are immediate: page
//! fetches already wait up to the full timeout, so no backoff is added.
//! A shutdown signal stops the loop between attempts and interrupts the
//! attempt in progress.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Errors that know whether another attempt could succeed
pub trait Recoverable {
    /// Returns true if the operation may succeed when retried
    fn is_recoverable(&self) -> bool {
        true
    }
}

impl Recoverable for crate::browser::BrowserError {
    fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::InvalidSelector(_) | Self::Unavailable(_) | Self::ContentMismatch { .. }
        )
    }
}

/// Failure of the last attempt
#[derive(Debug, PartialEq, Eq)]
pub enum RetryError<E> {
    /// The attempt did not finish before its deadline
    TimedOut { attempts: u32, timeout: Duration },

    /// The operation itself failed; the error is returned unchanged
    Failed { attempts: u32, error: E },

    /// Shutdown was signalled before the operation succeeded
    Cancelled { attempts: u32 },
}

impl<E> RetryError<E> {
    /// Number of attempts made before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            Self::TimedOut { attempts, .. }
            | Self::Failed { attempts, .. }
            | Self::Cancelled { attempts } => *attempts,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut { timeout, .. } => write!(f, "timed out after {:?}", timeout),
            Self::Failed { error, .. } => write!(f, "{}", error),
            Self::Cancelled { .. } => write!(f, "cancelled by shutdown"),
        }
    }
}

/// Runs `operation` up to `max_attempts` times, each bounded by `timeout`
///
/// A successful attempt returns immediately. A timeout or recoverable
/// failure triggers another attempt until `max_attempts` is reached; a
/// non-recoverable failure is returned at once. `max_attempts` below 1 is
/// treated as 1.
///
/// # Example
///
/// ```no_run
/// use docs_crawler::crawler::retry_with_timeout;
/// use docs_crawler::browser::BrowserError;
/// use std::time::Duration;
///
/// # async fn example() {
/// let outcome = retry_with_timeout(
///     |attempt| async move {
///         if attempt < 2 { Err(BrowserError::PageClosed) } else { Ok("loaded") }
///     },
///     3,
///     Duration::from_secs(5),
/// )
/// .await;
/// assert_eq!(outcome.unwrap(), "loaded");
/// # }
/// ```
pub async fn retry_with_timeout<T, E, F, Fut>(
    operation: F,
    max_attempts: u32,
    timeout: Duration,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Recoverable + fmt::Display,
{
    retry_until_shutdown(operation, max_attempts, timeout, None).await
}

/// Like `retry_with_timeout`, but gives up as soon as `shutdown` reads true
///
/// The flag is checked before every attempt, and an attempt in progress is
/// dropped when the flag flips. Both cases return `RetryError::Cancelled`
/// carrying the number of attempts started.
pub async fn retry_until_shutdown<T, E, F, Fut>(
    mut operation: F,
    max_attempts: u32,
    timeout: Duration,
    mut shutdown: Option<watch::Receiver<bool>>,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Recoverable + fmt::Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        if shutdown.as_ref().map_or(false, |rx| *rx.borrow()) {
            debug!(attempt, "Shutdown requested, not retrying");
            return Err(RetryError::Cancelled {
                attempts: attempt - 1,
            });
        }

        let bounded = tokio::time::timeout(timeout, operation(attempt));
        let outcome = match shutdown.as_mut() {
            Some(rx) => tokio::select! {
                outcome = bounded => outcome,
                _ = shutdown_signalled(rx) => {
                    debug!(attempt, "Shutdown requested, attempt abandoned");
                    return Err(RetryError::Cancelled { attempts: attempt });
                }
            },
            None => bounded.await,
        };

        let failure = match outcome {
            Ok(Ok(value)) => {
                if attempt > 1 {
                    debug!(attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Ok(Err(error)) => {
                let recoverable = error.is_recoverable();
                warn!(attempt, max_attempts, error = %error, "Operation failed");

                if !recoverable {
                    return Err(RetryError::Failed {
                        attempts: attempt,
                        error,
                    });
                }
                RetryError::Failed {
                    attempts: attempt,
                    error,
                }
            }
            Err(_) => {
                warn!(
                    attempt,
                    max_attempts,
                    timeout_ms = timeout.as_millis() as u64,
                    "Operation timed out"
                );
                RetryError::TimedOut {
                    attempts: attempt,
                    timeout,
                }
            }
        };

        if attempt >= max_attempts {
            return Err(failure);
        }
        attempt += 1;
    }
}

/// Resolves once the shutdown flag reads true; never if the sender is gone
async fn shutdown_signalled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
