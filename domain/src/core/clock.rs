//! Time helpers.
//!
//! The domain never reads the system clock; callers pass `now` in. These
//! helpers convert between `chrono` timestamps and `std::time::Duration`.

use chrono::{DateTime, Utc};
use std::time::Duration;

pub type Timestamp = DateTime<Utc>;

/// `at + ttl`, saturating instead of overflowing.
pub fn add_duration(at: Timestamp, ttl: Duration) -> Timestamp {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|d| at.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Elapsed time from `earlier` to `later`; zero if `later` is before `earlier`.
pub fn elapsed(earlier: Timestamp, later: Timestamp) -> Duration {
    (later - earlier).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_add_and_elapsed() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t1 = add_duration(t0, Duration::from_secs(90));
        assert_eq!(elapsed(t0, t1), Duration::from_secs(90));
        assert_eq!(elapsed(t1, t0), Duration::ZERO);
    }
}
