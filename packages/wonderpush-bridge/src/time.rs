//! Wall-clock helpers used for callback bookkeeping.

use std::time::Duration;

/// Returns the current Unix timestamp in milliseconds.
pub fn now_timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Time elapsed since `since_millis`, clamped at zero when the clock went backwards.
pub fn elapsed_since(since_millis: i64) -> Duration {
    let delta = now_timestamp_millis().saturating_sub(since_millis);
    Duration::from_millis(delta.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_timestamp_millis_is_reasonable() {
        let ts = now_timestamp_millis();
        // Should be after 2024-01-01 in millis
        assert!(ts > 1704067200_000, "Timestamp {} is too old", ts);
        // Should be before 2100-01-01 in millis
        assert!(ts < 4102444800_000, "Timestamp {} is too far in future", ts);
    }

    #[test]
    fn test_elapsed_since_future_is_zero() {
        let future = now_timestamp_millis() + 60_000;
        assert_eq!(elapsed_since(future), Duration::ZERO);
    }

    #[test]
    fn test_elapsed_since_past() {
        let past = now_timestamp_millis() - 5_000;
        assert!(elapsed_since(past) >= Duration::from_millis(5_000));
    }
}
