//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Calculate exponential backoff delay with jitter.
///
/// `attempt` is 1-based; attempt 0 yields no delay.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exponential = 2u64.saturating_pow(attempt - 1);
    let capped = base_ms.saturating_mul(exponential).min(max_ms);

    // Up to 10% extra so restarted backends do not re-register in lockstep.
    let jitter_range = capped / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        assert_eq!(calculate_backoff(0, 100, 2000), Duration::ZERO);

        let first = calculate_backoff(1, 100, 2000).as_millis();
        assert!((100..110).contains(&first), "{}", first);

        let second = calculate_backoff(2, 100, 2000).as_millis();
        assert!((200..220).contains(&second), "{}", second);

        let capped = calculate_backoff(30, 100, 1000).as_millis();
        assert!((1000..1100).contains(&capped), "{}", capped);
    }

    #[test]
    fn test_huge_attempt_does_not_overflow() {
        let delay = calculate_backoff(u32::MAX, 1000, 10_000);
        assert!(delay >= Duration::from_secs(10));
    }
}
