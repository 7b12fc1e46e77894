//! Conversions between 100-nanosecond ticks and wall-clock units.
//!
//! The ticks-based schema reports every duration and position in ticks;
//! 10,000,000 ticks make one second.

/// Ticks in one second.
pub const TICKS_PER_SECOND: u64 = 10_000_000;

/// Ticks in one minute.
pub const TICKS_PER_MINUTE: u64 = 60 * TICKS_PER_SECOND;

/// Convert whole seconds to ticks.
///
/// Returns `None` when the position does not fit in a `u64` tick count.
pub fn seconds_to_ticks(seconds: u64) -> Option<u64> {
    seconds.checked_mul(TICKS_PER_SECOND)
}

/// Convert whole minutes to ticks.
pub fn minutes_to_ticks(minutes: u64) -> u64 {
    minutes * TICKS_PER_MINUTE
}

/// Convert ticks to whole minutes, truncating toward zero.
pub fn ticks_to_minutes(ticks: u64) -> u64 {
    ticks / TICKS_PER_MINUTE
}

/// Convert ticks to whole seconds, truncating toward zero.
pub fn ticks_to_seconds(ticks: u64) -> u64 {
    ticks / TICKS_PER_SECOND
}

/// Convert a possibly fractional second count to ticks.
///
/// Negative and non-finite inputs yield `None`.
pub fn fractional_seconds_to_ticks(seconds: f64) -> Option<u64> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some((seconds * TICKS_PER_SECOND as f64).floor() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_round_trip() {
        for minutes in [0u64, 1, 42, 90, 181, 10_000] {
            let ticks = minutes_to_ticks(minutes);
            assert_eq!(ticks, minutes * 60 * 10_000_000);
            assert_eq!(ticks_to_minutes(ticks), minutes);
        }
    }

    #[test]
    fn test_ticks_to_minutes_truncates() {
        // 89 minutes 59 seconds
        let ticks = minutes_to_ticks(89) + seconds_to_ticks(59).unwrap();
        assert_eq!(ticks_to_minutes(ticks), 89);
    }

    #[test]
    fn test_seconds_to_ticks() {
        assert_eq!(seconds_to_ticks(1), Some(10_000_000));
        assert_eq!(seconds_to_ticks(125), Some(1_250_000_000));
        assert_eq!(ticks_to_seconds(1_250_000_001), 125);
    }

    #[test]
    fn test_seconds_to_ticks_overflow() {
        assert_eq!(seconds_to_ticks(u64::MAX / 1000), None);
        assert!(seconds_to_ticks(u64::MAX / TICKS_PER_SECOND).is_some());
    }

    #[test]
    fn test_fractional_seconds() {
        assert_eq!(fractional_seconds_to_ticks(1.5), Some(15_000_000));
        assert_eq!(fractional_seconds_to_ticks(-1.0), None);
        assert_eq!(fractional_seconds_to_ticks(f64::NAN), None);
    }
}
