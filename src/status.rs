//! Time-derived lead status (pure math, no DB).
//!
//! A lead's pipeline stage is a function of its timestamps and `now`, never
//! a stored column: `new` within `new_within_days` of the contact anchor,
//! `warm` within `warm_within_days`, `cold` after that. A recorded terminal
//! status short-circuits the ladder entirely.
//!
//! The inverse mapping ([`anchor_window`]) turns a stage back into the
//! anchor-instant window that derivation would label with that stage at
//! `now`. SQL filters bind those window bounds, so filtering and derivation
//! can never drift apart.

use chrono::{DateTime, Duration, Utc};

use crate::config::StatusThresholds;
use crate::types::LeadStatus;

/// Status plus how many days the lead has been in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedStatus {
    pub status: LeadStatus,
    pub age_days: i64,
}

/// Parse a stored timestamp and compute whole days since then, clamped to
/// zero. Unparseable or future values read as age 0, never an error.
pub fn clamped_days_since(value: &str, now: DateTime<Utc>) -> i64 {
    let parsed = match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(_) => {
            // Try SQLite datetime format (no timezone)
            match chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
                Ok(naive) => naive.and_utc(),
                Err(_) => return 0,
            }
        }
    };
    (now - parsed).num_days().max(0)
}

/// Derive the pipeline status of a lead at `now`.
///
/// A recorded terminal status wins unconditionally and ages from the instant
/// it was recorded. Otherwise the age ladder runs over the contact anchor:
/// `last_contacted_at` if the lead was ever contacted, `imported_at` if not.
pub fn derive_status(
    imported_at: &str,
    last_contacted_at: Option<&str>,
    terminal_status: Option<&str>,
    terminal_at: Option<&str>,
    now: DateTime<Utc>,
    thresholds: &StatusThresholds,
) -> DerivedStatus {
    match terminal_status {
        Some("converted") => {
            return DerivedStatus {
                status: LeadStatus::Converted,
                age_days: terminal_at.map(|at| clamped_days_since(at, now)).unwrap_or(0),
            };
        }
        Some("not_interested") => {
            return DerivedStatus {
                status: LeadStatus::NotInterested,
                age_days: terminal_at.map(|at| clamped_days_since(at, now)).unwrap_or(0),
            };
        }
        _ => {}
    }

    let anchor = last_contacted_at.unwrap_or(imported_at);
    let age_days = clamped_days_since(anchor, now);

    let status = if age_days < thresholds.new_within_days {
        LeadStatus::New
    } else if age_days < thresholds.warm_within_days {
        LeadStatus::Warm
    } else {
        LeadStatus::Cold
    };

    DerivedStatus { status, age_days }
}

/// Half-open-ish window over the contact anchor: `anchor > after` and
/// `anchor <= through`, absent bound = unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorWindow {
    pub after: Option<DateTime<Utc>>,
    pub through: Option<DateTime<Utc>>,
}

/// The anchor window that [`derive_status`] would label with `status` at
/// `now`. Returns `None` for terminal statuses, which are matched by their
/// stored column instead of a time window.
///
/// The bound orientation follows from the floor-day age: `age < n` holds
/// exactly when `anchor > now - n days`, so `new` is an exclusive lower
/// bound and `cold` an inclusive upper bound. Future anchors (clamped to
/// age 0) land in `new` on both sides of the mapping.
pub fn anchor_window(
    status: LeadStatus,
    now: DateTime<Utc>,
    thresholds: &StatusThresholds,
) -> Option<AnchorWindow> {
    let new_bound = now - Duration::days(thresholds.new_within_days);
    let warm_bound = now - Duration::days(thresholds.warm_within_days);
    match status {
        LeadStatus::New => Some(AnchorWindow {
            after: Some(new_bound),
            through: None,
        }),
        LeadStatus::Warm => Some(AnchorWindow {
            after: Some(warm_bound),
            through: Some(new_bound),
        }),
        LeadStatus::Cold => Some(AnchorWindow {
            after: None,
            through: Some(warm_bound),
        }),
        LeadStatus::Converted | LeadStatus::NotInterested => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::fmt_utc;
    use chrono::TimeZone;

    fn thresholds() -> StatusThresholds {
        StatusThresholds {
            new_within_days: 7,
            warm_within_days: 30,
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_ladder_from_import_age() {
        // Imported 40/10/2 days ago, never contacted.
        let now = at("2025-06-15T12:00:00Z");
        let cases = [
            ("2025-05-06T12:00:00Z", LeadStatus::Cold, 40),
            ("2025-06-05T12:00:00Z", LeadStatus::Warm, 10),
            ("2025-06-13T12:00:00Z", LeadStatus::New, 2),
        ];
        for (imported, expected_status, expected_age) in cases {
            let derived = derive_status(imported, None, None, None, now, &thresholds());
            assert_eq!(derived.status, expected_status, "imported {imported}");
            assert_eq!(derived.age_days, expected_age, "imported {imported}");
        }
    }

    #[test]
    fn test_contact_overrides_import_anchor() {
        let now = at("2025-06-15T12:00:00Z");
        // Imported long ago, but contacted 3 days ago.
        let derived = derive_status(
            "2025-01-01T00:00:00Z",
            Some("2025-06-12T12:00:00Z"),
            None,
            None,
            now,
            &thresholds(),
        );
        assert_eq!(derived.status, LeadStatus::New);
        assert_eq!(derived.age_days, 3);
    }

    #[test]
    fn test_threshold_boundaries() {
        let now = at("2025-06-15T12:00:00Z");
        // Exactly 7 days of age is no longer `new`.
        let seven = derive_status("2025-06-08T12:00:00Z", None, None, None, now, &thresholds());
        assert_eq!(seven.status, LeadStatus::Warm);
        assert_eq!(seven.age_days, 7);
        // A second short of 7 days still is.
        let just_under =
            derive_status("2025-06-08T12:00:01Z", None, None, None, now, &thresholds());
        assert_eq!(just_under.status, LeadStatus::New);
        assert_eq!(just_under.age_days, 6);
        // Exactly 30 days is `cold`.
        let thirty = derive_status("2025-05-16T12:00:00Z", None, None, None, now, &thresholds());
        assert_eq!(thirty.status, LeadStatus::Cold);
        assert_eq!(thirty.age_days, 30);
    }

    #[test]
    fn test_future_anchor_clamps_to_zero() {
        let now = at("2025-06-15T12:00:00Z");
        let derived = derive_status("2025-07-01T00:00:00Z", None, None, None, now, &thresholds());
        assert_eq!(derived.status, LeadStatus::New);
        assert_eq!(derived.age_days, 0);
    }

    #[test]
    fn test_malformed_anchor_reads_as_age_zero() {
        let now = at("2025-06-15T12:00:00Z");
        let derived = derive_status("definitely not a date", None, None, None, now, &thresholds());
        assert_eq!(derived.status, LeadStatus::New);
        assert_eq!(derived.age_days, 0);
    }

    #[test]
    fn test_sqlite_datetime_format_accepted() {
        let now = at("2025-06-15T12:00:00Z");
        let derived = derive_status("2025-06-05 12:00:00", None, None, None, now, &thresholds());
        assert_eq!(derived.status, LeadStatus::Warm);
        assert_eq!(derived.age_days, 10);
    }

    #[test]
    fn test_terminal_status_is_sticky() {
        let now = at("2025-06-15T12:00:00Z");
        // Timestamps alone would say `cold`, but the recorded terminal wins.
        let derived = derive_status(
            "2024-01-01T00:00:00Z",
            None,
            Some("converted"),
            Some("2025-06-10T12:00:00Z"),
            now,
            &thresholds(),
        );
        assert_eq!(derived.status, LeadStatus::Converted);
        assert_eq!(derived.age_days, 5);

        // And stays put as now advances.
        let much_later = at("2026-06-15T12:00:00Z");
        let later = derive_status(
            "2024-01-01T00:00:00Z",
            None,
            Some("converted"),
            Some("2025-06-10T12:00:00Z"),
            much_later,
            &thresholds(),
        );
        assert_eq!(later.status, LeadStatus::Converted);
    }

    #[test]
    fn test_monotonic_in_now() {
        // Rank never decreases as now advances over a fixed lead.
        let imported = "2025-06-01T00:00:00Z";
        let mut previous_rank = 0u8;
        for day in 0..60 {
            let now = at("2025-06-01T06:00:00Z") + Duration::days(day);
            let derived = derive_status(imported, None, None, None, now, &thresholds());
            assert!(
                derived.status.rank() >= previous_rank,
                "rank regressed at day {day}"
            );
            previous_rank = derived.status.rank();
        }
    }

    #[test]
    fn test_window_round_trips_through_derivation() {
        // Any anchor inside the window for a status must derive to that
        // status, and anchors just outside must not.
        let now = at("2025-06-15T12:00:00Z");
        let t = thresholds();
        for status in [LeadStatus::New, LeadStatus::Warm, LeadStatus::Cold] {
            let window = anchor_window(status, now, &t).unwrap();
            let mut probes: Vec<DateTime<Utc>> = Vec::new();
            if let Some(after) = window.after {
                probes.push(after + Duration::seconds(1));
                // The exclusive bound itself belongs to the next-older stage.
                let outside = derive_status(&fmt_utc(after), None, None, None, now, &t);
                assert_ne!(outside.status, status, "after bound leaked into {status:?}");
            }
            if let Some(through) = window.through {
                probes.push(through);
                let outside = derive_status(
                    &fmt_utc(through + Duration::seconds(1)),
                    None,
                    None,
                    None,
                    now,
                    &t,
                );
                assert_ne!(outside.status, status, "through bound leaked out of {status:?}");
            }
            for probe in probes {
                let derived = derive_status(&fmt_utc(probe), None, None, None, now, &t);
                assert_eq!(derived.status, status, "probe {probe} for {status:?}");
            }
        }
    }

    #[test]
    fn test_terminal_statuses_have_no_window() {
        let now = Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
        assert!(anchor_window(LeadStatus::Converted, now, &thresholds()).is_none());
        assert!(anchor_window(LeadStatus::NotInterested, now, &thresholds()).is_none());
    }
}
