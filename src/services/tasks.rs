//! Follow-up tasks against leads: due-window listing and counts, plus
//! completion, which doubles as a contact with the lead.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::Config;
use crate::db::{DbTask, LeadDb};
use crate::error::CoreError;
use crate::page::Page;
use crate::schedule::resolve_timezone;
use crate::types::{DueFilter, DueFilterCounts, ScheduleStatus};
use crate::util::{fmt_utc, parse_utc, validate_bounded_string, validate_id_slug};

use super::{page_request, schedule_selector, ScheduleQuery};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub lead_id: String,
    pub title: String,
    /// RFC3339 due instant.
    pub due_at: String,
}

/// Create a pending task for an existing lead. Returns the task id.
pub fn create_task(
    db: &LeadDb,
    owner_id: &str,
    request: NewTask,
    now: DateTime<Utc>,
) -> Result<String, CoreError> {
    validate_id_slug(owner_id, "ownerId")?;
    validate_id_slug(&request.lead_id, "leadId")?;
    let title = validate_bounded_string(&request.title, "title", 1, 280)?;
    let due_at = parse_utc(&request.due_at, "dueAt")?;

    db.get_lead(owner_id, &request.lead_id)?
        .ok_or_else(|| CoreError::not_found("lead", request.lead_id.as_str()))?;

    let stamp = fmt_utc(now);
    let id = Uuid::new_v4().to_string();
    db.insert_task(&DbTask {
        id: id.clone(),
        owner_id: owner_id.to_string(),
        lead_id: request.lead_id,
        title,
        due_at: fmt_utc(due_at),
        status: ScheduleStatus::Pending.as_str().to_string(),
        completed_at: None,
        created_at: stamp.clone(),
        updated_at: stamp,
    })?;
    Ok(id)
}

/// Complete a task. The first completion stamps `completed_at` and counts
/// as a contact with the lead; repeats return false and change nothing.
/// Both writes commit together.
pub fn complete_task(
    db: &LeadDb,
    owner_id: &str,
    id: &str,
    now: DateTime<Utc>,
) -> Result<bool, CoreError> {
    validate_id_slug(owner_id, "ownerId")?;
    validate_id_slug(id, "taskId")?;
    let task = db
        .get_task(owner_id, id)?
        .ok_or_else(|| CoreError::not_found("task", id))?;

    let stamp = fmt_utc(now);
    let completed = db.with_transaction(|db| {
        let completed = db.complete_task(owner_id, id, &stamp)?;
        if completed {
            db.touch_last_contacted(owner_id, &task.lead_id, &stamp, &stamp)?;
        }
        Ok(completed)
    })?;
    Ok(completed)
}

pub fn delete_task(db: &LeadDb, owner_id: &str, id: &str) -> Result<(), CoreError> {
    validate_id_slug(owner_id, "ownerId")?;
    validate_id_slug(id, "taskId")?;
    if !db.delete_task(owner_id, id)? {
        return Err(CoreError::not_found("task", id));
    }
    Ok(())
}

/// One page of tasks, soonest due first. The due window is evaluated in the
/// caller's timezone (falling back to the configured default), and the
/// filter combines with any explicit status restriction; overdue +
/// completed is provably empty and returns without touching the database.
pub fn list_tasks(
    db: &LeadDb,
    config: &Config,
    owner_id: &str,
    query: ScheduleQuery,
    now: DateTime<Utc>,
) -> Result<Page<DbTask>, CoreError> {
    validate_id_slug(owner_id, "ownerId")?;
    let filter = match query.filter.as_deref() {
        Some(token) => DueFilter::parse(token)?,
        None => DueFilter::All,
    };
    let status = match query.status.as_deref() {
        Some(token) => Some(ScheduleStatus::parse(token)?),
        None => None,
    };
    let request = page_request(query.page, query.page_size, config)?;
    let tz = resolve_timezone(query.timezone.as_deref(), &config.default_timezone);

    let Some(selector) = schedule_selector(owner_id, filter, status, now, tz) else {
        return Ok(Page {
            items: Vec::new(),
            has_next_page: false,
            total_count: request.is_first().then_some(0),
        });
    };

    let rows = db.list_tasks_page(&selector, request.offset(), request.fetch_limit())?;
    let (items, has_next_page) = request.take_page(rows);
    let total_count = if request.is_first() {
        Some(db.count_tasks(&selector)?)
    } else {
        None
    };
    Ok(Page {
        items,
        has_next_page,
        total_count,
    })
}

/// Task counts per due bucket under an optional status restriction. Each
/// bucket is counted through the same selector the listing uses, so a
/// bucket count always equals the matching listing's total.
pub fn filter_counts(
    db: &LeadDb,
    config: &Config,
    owner_id: &str,
    status: Option<&str>,
    timezone: Option<&str>,
    now: DateTime<Utc>,
) -> Result<DueFilterCounts, CoreError> {
    validate_id_slug(owner_id, "ownerId")?;
    let status = match status {
        Some(token) => Some(ScheduleStatus::parse(token)?),
        None => None,
    };
    let tz = resolve_timezone(timezone, &config.default_timezone);

    let count_for = |filter: DueFilter| -> Result<i64, CoreError> {
        match schedule_selector(owner_id, filter, status, now, tz) {
            Some(selector) => Ok(db.count_tasks(&selector)?),
            None => Ok(0),
        }
    };
    Ok(DueFilterCounts {
        today: count_for(DueFilter::Today)?,
        overdue: count_for(DueFilter::Overdue)?,
        upcoming: count_for(DueFilter::Upcoming)?,
        all: count_for(DueFilter::All)?,
    })
}
