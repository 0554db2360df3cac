use time::{Duration, OffsetDateTime};

/// Every new account gets the same fixed trial length.
pub const TRIAL_PERIOD_DAYS: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialWindow {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

/// Compute the trial window at registration time. Called once per user;
/// the window is immutable afterwards.
pub fn start_window(now: OffsetDateTime) -> TrialWindow {
    TrialWindow {
        start: now,
        end: now + Duration::days(TRIAL_PERIOD_DAYS),
    }
}

/// The trial is active through the end instant inclusive. No grace period.
pub fn is_active(trial_end: OffsetDateTime, now: OffsetDateTime) -> bool {
    now <= trial_end
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn window_spans_ten_days() {
        let t0 = datetime!(2024-03-01 12:00 UTC);
        let window = start_window(t0);
        assert_eq!(window.start, t0);
        assert_eq!(window.end, t0 + Duration::days(10));
        assert!(window.end > window.start);
    }

    #[test]
    fn active_within_window() {
        let t0 = datetime!(2024-03-01 12:00 UTC);
        let window = start_window(t0);
        assert!(is_active(window.end, t0 + Duration::days(9)));
        assert!(is_active(window.end, window.end));
    }

    #[test]
    fn inactive_after_window() {
        let t0 = datetime!(2024-03-01 12:00 UTC);
        let window = start_window(t0);
        assert!(!is_active(window.end, t0 + Duration::days(11)));
        assert!(!is_active(window.end, window.end + Duration::seconds(1)));
    }
}
