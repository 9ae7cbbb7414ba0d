//! Business operations over the lead database.
//!
//! Services validate caller input up front, stamp identities and timestamps,
//! and compose the db layer's shared predicates with the derived-status and
//! due-window math. Every operation is a function of its arguments and an
//! explicit `now`; nothing here reads the wall clock.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::config::Config;
use crate::db::ScheduleSelector;
use crate::error::CoreError;
use crate::page::PageRequest;
use crate::schedule::resolve_due_window;
use crate::types::{DueFilter, ScheduleStatus};
use crate::util::{fmt_utc, validate_bounded_string};

pub mod consultations;
pub mod leads;
pub mod tasks;

/// Listing parameters shared by tasks and consultations. All fields are
/// optional; unset paging falls back to the configured defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleQuery {
    /// Due-window bucket: today | overdue | upcoming | all (default all).
    #[serde(default)]
    pub filter: Option<String>,
    /// Explicit status restriction: pending | completed.
    #[serde(default)]
    pub status: Option<String>,
    /// IANA timezone the day boundaries are computed in.
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
}

/// The one mapping from a due filter plus status restriction to a row
/// predicate, shared by the paged task/consultation listings and their
/// bucket counts. Returns `None` when the combination can match nothing
/// (overdue + completed), letting callers skip the query entirely.
pub(crate) fn schedule_selector(
    owner_id: &str,
    filter: DueFilter,
    status: Option<ScheduleStatus>,
    now: DateTime<Utc>,
    tz: Tz,
) -> Option<ScheduleSelector> {
    let status = filter.combine_status(status)?;
    let window = resolve_due_window(filter, now, tz);
    Some(ScheduleSelector::new(
        owner_id,
        status.map(|s| s.as_str()),
        window.start.map(fmt_utc),
        window.end.map(fmt_utc),
    ))
}

/// Build a validated page request, falling back to the configured page size.
pub(crate) fn page_request(
    page: Option<i64>,
    page_size: Option<i64>,
    config: &Config,
) -> Result<PageRequest, CoreError> {
    PageRequest::new(
        page.unwrap_or(0),
        page_size.unwrap_or(config.default_page_size),
    )
}

/// Trim an optional free-text field; blank collapses to `None`, anything
/// kept is length-checked.
pub(crate) fn normalize_detail(
    value: Option<String>,
    field: &'static str,
    max: usize,
) -> Result<Option<String>, CoreError> {
    match value {
        None => Ok(None),
        Some(raw) => {
            if raw.trim().is_empty() {
                return Ok(None);
            }
            Ok(Some(validate_bounded_string(&raw, field, 1, max)?))
        }
    }
}
