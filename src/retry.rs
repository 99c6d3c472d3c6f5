//! Retry policy for transient upstream failures.
//!
//! The policy is deliberately small: a fixed number of retries with a fixed
//! delay between attempts. [`RetryPolicy::decide`] is the whole state machine
//! driving [`Client::call`](crate::Client::call); it is pure so every exit of
//! the attempt loop can be tested without a network.

use crate::error::TransportError;
use http::StatusCode;
use std::time::Duration;

/// Status codes that trigger another attempt while attempts remain.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Returns `true` if `status` is one of [`RETRYABLE_STATUSES`].
///
/// # Examples
///
/// ```
/// use cart_client::retry::is_retryable_status;
/// use http::StatusCode;
///
/// assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
/// assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
/// assert!(!is_retryable_status(StatusCode::NOT_IMPLEMENTED));
/// assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
/// ```
pub fn is_retryable_status(status: StatusCode) -> bool {
    RETRYABLE_STATUSES.contains(&status.as_u16())
}

/// How many times to retry and how long to wait in between.
///
/// # Examples
///
/// ```
/// use cart_client::RetryPolicy;
/// use std::time::Duration;
///
/// // Up to three attempts, 200ms apart.
/// let policy = RetryPolicy::new(2, Duration::from_millis(200));
/// assert_eq!(policy.total_attempts(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Number of retries after the first attempt.
    pub max_retries: usize,
    /// Fixed delay before each retry. Never applied after the final attempt.
    pub backoff: Duration,
}

/// What a single attempt produced.
#[derive(Debug, Clone, Copy)]
pub enum Outcome<'a> {
    /// The upstream answered with this status.
    Responded(StatusCode),
    /// No response was received.
    Failed(&'a TransportError),
}

/// What the attempt loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Hand the received response to the caller.
    Return,
    /// Wait `delay`, then make another attempt.
    Retry {
        /// How long to wait first; may be zero.
        delay: Duration,
    },
    /// Attempts are exhausted without a response; synthesize the timeout response.
    GiveUp,
}

impl RetryPolicy {
    /// Creates a new `RetryPolicy`.
    pub fn new(max_retries: usize, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self::default()
    }

    /// Total number of attempts, including the first.
    pub fn total_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }

    /// Decides what follows attempt `attempt` (0-indexed).
    ///
    /// # Examples
    ///
    /// ```
    /// use cart_client::retry::{Decision, Outcome, RetryPolicy};
    /// use http::StatusCode;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::new(1, Duration::from_millis(50));
    ///
    /// let first = policy.decide(0, Outcome::Responded(StatusCode::SERVICE_UNAVAILABLE));
    /// assert_eq!(first, Decision::Retry { delay: Duration::from_millis(50) });
    ///
    /// // Retryable statuses are returned verbatim once attempts run out.
    /// let last = policy.decide(1, Outcome::Responded(StatusCode::SERVICE_UNAVAILABLE));
    /// assert_eq!(last, Decision::Return);
    /// ```
    pub fn decide(&self, attempt: usize, outcome: Outcome<'_>) -> Decision {
        let attempts_remain = attempt.saturating_add(1) < self.total_attempts();

        match outcome {
            Outcome::Responded(status) if is_retryable_status(status) && attempts_remain => {
                Decision::Retry {
                    delay: self.backoff,
                }
            }
            Outcome::Responded(_) => Decision::Return,
            Outcome::Failed(_) if attempts_remain => Decision::Retry {
                delay: self.backoff,
            },
            Outcome::Failed(_) => Decision::GiveUp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeout() -> TransportError {
        TransportError::timeout("timed out")
    }

    #[test]
    fn test_total_attempts() {
        assert_eq!(RetryPolicy::none().total_attempts(), 1);
        assert_eq!(RetryPolicy::new(3, Duration::ZERO).total_attempts(), 4);
        assert_eq!(
            RetryPolicy::new(usize::MAX, Duration::ZERO).total_attempts(),
            usize::MAX
        );
    }

    #[test]
    fn test_every_retryable_status_retries_when_attempts_remain() {
        let policy = RetryPolicy::new(1, Duration::from_secs(1));
        for code in RETRYABLE_STATUSES {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(
                policy.decide(0, Outcome::Responded(status)),
                Decision::Retry {
                    delay: Duration::from_secs(1)
                },
                "status {}",
                code
            );
        }
    }

    #[test]
    fn test_non_retryable_statuses_return_immediately() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1));
        for code in [200, 201, 204, 400, 401, 404, 409, 422, 501, 505] {
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(
                policy.decide(0, Outcome::Responded(status)),
                Decision::Return,
                "status {}",
                code
            );
        }
    }

    #[test]
    fn test_transport_failure_retries_then_gives_up() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let err = timeout();

        assert_eq!(
            policy.decide(0, Outcome::Failed(&err)),
            Decision::Retry {
                delay: Duration::ZERO
            }
        );
        assert_eq!(
            policy.decide(1, Outcome::Failed(&err)),
            Decision::Retry {
                delay: Duration::ZERO
            }
        );
        assert_eq!(policy.decide(2, Outcome::Failed(&err)), Decision::GiveUp);
    }

    #[test]
    fn test_no_retries_gives_up_on_first_failure() {
        let err = TransportError::connect("connection refused");
        assert_eq!(
            RetryPolicy::none().decide(0, Outcome::Failed(&err)),
            Decision::GiveUp
        );
        assert_eq!(
            RetryPolicy::none().decide(0, Outcome::Responded(StatusCode::BAD_GATEWAY)),
            Decision::Return
        );
    }
}
