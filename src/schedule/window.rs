//! Due-date windows for the today / overdue / upcoming / all filters.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::clock::{day_bounds, DayBounds};
use crate::types::DueFilter;

/// Half-open UTC interval over due instants. `None` means unbounded on that
/// side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DueWindow {
    /// Membership test: `start <= instant < end`.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if instant < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if instant >= end {
                return false;
            }
        }
        true
    }
}

/// Translate a filter into a due-instant window.
///
/// The three bounded filters partition the timeline: `overdue` ends exactly
/// where `today` starts, and `today` ends exactly where `upcoming` starts.
/// `all` is unbounded on both sides. Whether `overdue` also pins the status
/// to pending is decided by [`DueFilter::combine_status`], not here.
pub fn due_window(filter: DueFilter, bounds: &DayBounds) -> DueWindow {
    match filter {
        DueFilter::Today => DueWindow {
            start: Some(bounds.start_of_today),
            end: Some(bounds.start_of_tomorrow),
        },
        DueFilter::Overdue => DueWindow {
            start: None,
            end: Some(bounds.start_of_today),
        },
        DueFilter::Upcoming => DueWindow {
            start: Some(bounds.start_of_tomorrow),
            end: None,
        },
        DueFilter::All => DueWindow {
            start: None,
            end: None,
        },
    }
}

/// Resolve `filter` against the local day containing `now` in `tz`.
pub fn resolve_due_window(filter: DueFilter, now: DateTime<Utc>, tz: Tz) -> DueWindow {
    due_window(filter, &day_bounds(now, tz))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    /// Asserts exactly one bounded filter claims `due` and returns it.
    fn bucket_of(due: DateTime<Utc>, bounds: &DayBounds) -> DueFilter {
        let claims: Vec<DueFilter> = [DueFilter::Today, DueFilter::Overdue, DueFilter::Upcoming]
            .into_iter()
            .filter(|f| due_window(*f, bounds).contains(due))
            .collect();
        assert_eq!(claims.len(), 1, "exactly one bucket must claim {}", due);
        assert!(due_window(DueFilter::All, bounds).contains(due));
        claims[0]
    }

    #[test]
    fn test_windows_partition_the_timeline() {
        let bounds = day_bounds(at("2025-06-01T08:00:00Z"), Tz::UTC);
        let probes = [
            ("2024-12-25T09:00:00Z", DueFilter::Overdue),
            ("2025-05-31T23:59:59Z", DueFilter::Overdue),
            ("2025-06-01T00:00:00Z", DueFilter::Today),
            ("2025-06-01T12:00:00Z", DueFilter::Today),
            ("2025-06-01T23:59:59Z", DueFilter::Today),
            ("2025-06-02T00:00:00Z", DueFilter::Upcoming),
            ("2025-08-15T00:00:00Z", DueFilter::Upcoming),
        ];
        for (due, expected) in probes {
            assert_eq!(bucket_of(at(due), &bounds), expected, "due {}", due);
        }
    }

    #[test]
    fn test_day_start_belongs_to_today_not_overdue() {
        let bounds = day_bounds(at("2025-06-01T08:00:00Z"), Tz::UTC);
        let start = bounds.start_of_today;
        assert!(due_window(DueFilter::Today, &bounds).contains(start));
        assert!(!due_window(DueFilter::Overdue, &bounds).contains(start));
    }

    #[test]
    fn test_day_end_belongs_to_upcoming_not_today() {
        let bounds = day_bounds(at("2025-06-01T08:00:00Z"), Tz::UTC);
        let end = bounds.start_of_tomorrow;
        assert!(due_window(DueFilter::Upcoming, &bounds).contains(end));
        assert!(!due_window(DueFilter::Today, &bounds).contains(end));
    }

    #[test]
    fn test_same_due_instant_shifts_bucket_with_timezone() {
        // A task due at midnight UTC on June 1, viewed at 08:00 UTC: the day
        // has barely started in UTC but Los Angeles is still on May 31's
        // side of its own midnight (07:00 UTC), so the task is already late
        // there.
        let now = at("2025-06-01T08:00:00Z");
        let due = at("2025-06-01T00:00:00Z");

        let utc = day_bounds(now, Tz::UTC);
        assert_eq!(bucket_of(due, &utc), DueFilter::Today);

        let la = day_bounds(now, chrono_tz::America::Los_Angeles);
        assert_eq!(bucket_of(due, &la), DueFilter::Overdue);
    }

    #[test]
    fn test_partition_holds_across_a_dst_gap_day() {
        // Cuba's 2025-03-09 starts at 01:00 local (05:00 UTC) because the
        // spring-forward transition skipped midnight.
        let bounds = day_bounds(at("2025-03-09T12:00:00Z"), chrono_tz::America::Havana);
        assert_eq!(bucket_of(at("2025-03-09T04:59:59Z"), &bounds), DueFilter::Overdue);
        assert_eq!(bucket_of(at("2025-03-09T05:00:00Z"), &bounds), DueFilter::Today);
        assert_eq!(bucket_of(at("2025-03-10T03:59:59Z"), &bounds), DueFilter::Today);
        assert_eq!(bucket_of(at("2025-03-10T04:00:00Z"), &bounds), DueFilter::Upcoming);
    }

    #[test]
    fn test_all_is_unbounded() {
        let window = resolve_due_window(DueFilter::All, at("2025-06-01T08:00:00Z"), Tz::UTC);
        assert_eq!(window, DueWindow { start: None, end: None });
        assert!(window.contains(at("1970-01-01T00:00:00Z")));
        assert!(window.contains(at("2999-12-31T23:59:59Z")));
    }
}
