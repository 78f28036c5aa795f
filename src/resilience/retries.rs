//! Failover policy for forwarded requests.
//!
//! # Responsibilities
//! - Classify backend responses as failures (5xx) or final answers
//! - Bound the number of backends one request may try

use axum::http::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first.
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// A server-side status counts against the backend and triggers failover.
    pub fn is_backend_failure(status: StatusCode) -> bool {
        status.is_server_error()
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based),
    /// given how many untried candidates remain.
    pub fn should_retry(&self, attempt: u32, remaining_candidates: usize) -> bool {
        attempt < self.max_attempts && remaining_candidates > 0
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classification() {
        assert!(RetryPolicy::is_backend_failure(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(RetryPolicy::is_backend_failure(StatusCode::BAD_GATEWAY));
        assert!(!RetryPolicy::is_backend_failure(StatusCode::BAD_REQUEST));
        assert!(!RetryPolicy::is_backend_failure(StatusCode::NOT_FOUND));
        assert!(!RetryPolicy::is_backend_failure(StatusCode::OK));
    }

    #[test]
    fn test_attempt_budget() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1, 2));
        assert!(policy.should_retry(2, 1));
        assert!(!policy.should_retry(3, 5));
        assert!(!policy.should_retry(1, 0));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
    }
}
