//! Local-day resolution.
//!
//! Stored timestamps are UTC, but "today" is a property of wherever the
//! caller is. Day boundaries are computed from the timezone rules on every
//! request; offsets are never hardcoded.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Upper bound on the forward scan for a skipped local midnight. The largest
/// transition in the tz database skips one whole calendar day.
const GAP_SCAN_MINUTES: i64 = 24 * 60;

/// UTC instants of local midnight today and tomorrow in some timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBounds {
    pub start_of_today: DateTime<Utc>,
    pub start_of_tomorrow: DateTime<Utc>,
}

/// Pick the timezone for a request: the caller's if it parses, the configured
/// default when none was supplied. Never fails; an unrecognized name degrades
/// to UTC with a warning so filtering keeps working.
pub fn resolve_timezone(requested: Option<&str>, default_tz: &str) -> Tz {
    match requested {
        Some(name) => match name.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                log::warn!("Unrecognized timezone '{}'; falling back to UTC", name);
                Tz::UTC
            }
        },
        None => match default_tz.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                log::warn!(
                    "Configured timezone '{}' is invalid; falling back to UTC",
                    default_tz
                );
                Tz::UTC
            }
        },
    }
}

/// Compute the UTC instants of local midnight "today" and "tomorrow" in `tz`,
/// as observed at `now`.
pub fn day_bounds(now: DateTime<Utc>, tz: Tz) -> DayBounds {
    let today = now.with_timezone(&tz).date_naive();
    let tomorrow = today.succ_opt().expect("date is within chrono's range");
    DayBounds {
        start_of_today: local_day_start(tz, today),
        start_of_tomorrow: local_day_start(tz, tomorrow),
    }
}

/// Resolve local midnight of `date` to a UTC instant, handling DST edges.
///
/// A fall-back transition repeats midnight; the day starts at the first
/// occurrence. A spring-forward transition can skip midnight entirely (Cuba
/// shifts at 00:00); the day then starts at the first wall-clock minute that
/// exists.
fn local_day_start(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    // Fast path: unambiguous local midnight.
    if let Some(dt) = tz
        .with_ymd_and_hms(date.year(), date.month(), date.day(), 0, 0, 0)
        .single()
    {
        return dt.with_timezone(&Utc);
    }

    let midnight = date.and_time(NaiveTime::MIN);

    // Repeated midnight: take the earlier instant.
    if let Some(dt) = tz.from_local_datetime(&midnight).earliest() {
        return dt.with_timezone(&Utc);
    }

    // Skipped midnight: scan forward for the first minute of the day that
    // maps to a real instant.
    for minutes in 1..=GAP_SCAN_MINUTES {
        let probe = midnight + Duration::minutes(minutes);
        if let Some(dt) = tz.from_local_datetime(&probe).earliest() {
            log::warn!(
                "DST gap at midnight on {} in {}; day starts at {}",
                date,
                tz,
                probe.time()
            );
            return dt.with_timezone(&Utc);
        }
    }

    // Absolute fallback: interpret midnight as UTC.
    log::warn!(
        "Could not resolve start of {} in {}; falling back to UTC",
        date,
        tz
    );
    Utc.from_utc_datetime(&midnight)
}
