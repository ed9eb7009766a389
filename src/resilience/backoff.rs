//! Capped exponential backoff with equal jitter.

use rand::Rng;
use std::time::Duration;

/// Delay to wait after `attempt` failed attempts.
///
/// Half of the capped exponential delay is fixed, the other half is random,
/// so concurrent retries spread out without ever collapsing to zero.
pub fn jittered_delay(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let factor = 2u64.saturating_pow(attempt - 1);
    let capped = base_ms.saturating_mul(factor).min(max_ms);

    let half = capped / 2;
    let spread = capped - half;
    let jitter = if spread > 0 {
        rand::thread_rng().gen_range(0..=spread)
    } else {
        0
    };

    Duration::from_millis(half + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_attempt_has_no_delay() {
        assert_eq!(jittered_delay(0, 100, 1000), Duration::ZERO);
    }

    #[test]
    fn test_delay_bounds() {
        for _ in 0..50 {
            let d1 = jittered_delay(1, 100, 2000).as_millis();
            assert!((50..=100).contains(&d1));

            let d3 = jittered_delay(3, 100, 2000).as_millis();
            assert!((200..=400).contains(&d3));
        }
    }

    #[test]
    fn test_delay_is_capped() {
        for _ in 0..50 {
            let d = jittered_delay(30, 100, 500).as_millis();
            assert!((250..=500).contains(&d));
        }
    }

    #[test]
    fn test_zero_base_never_sleeps() {
        assert_eq!(jittered_delay(4, 0, 500), Duration::ZERO);
    }
}
