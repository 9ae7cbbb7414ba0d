//! Lead registry: import, contact tracking, terminal transitions, and the
//! derived-status listing the pipeline view is built on.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::{Config, StatusThresholds};
use crate::db::{DbContactPoint, DbLead, LeadDb, LeadDetails, LeadSelector};
use crate::error::CoreError;
use crate::page::Page;
use crate::status::{anchor_window, derive_status};
use crate::types::{ContactKind, Lead, LeadStatus, LeadStatusCounts};
use crate::util::{fmt_utc, parse_utc, validate_id_slug};

use super::{normalize_detail, page_request};

/// Fields accepted when importing a lead. Everything is optional, but at
/// least one identifying field must survive trimming.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLead {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub goals: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Contact-detail replacement. All six fields are written as given; a
/// missing field clears the stored value. Timestamps, contact anchor, and
/// terminal state are untouchable from here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeadDetails {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub goals: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A recorded touch with a lead.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContactPoint {
    pub lead_id: String,
    /// call | text | email | meeting | other
    pub kind: String,
    #[serde(default)]
    pub note: Option<String>,
    /// RFC3339 instant of the contact; defaults to `now`. A backdated
    /// instant is recorded but never rewinds the lead's contact anchor.
    #[serde(default)]
    pub occurred_at: Option<String>,
}

/// Listing parameters for leads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadQuery {
    /// Derived-status restriction: new | warm | cold | converted |
    /// not_interested.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
}

/// The one mapping from a status restriction to a row predicate. Pages,
/// per-status counts, and the unfiltered total all come through here, so
/// they cannot disagree about which rows a status claims.
fn selector_for(
    owner_id: &str,
    status: Option<LeadStatus>,
    now: DateTime<Utc>,
    thresholds: &StatusThresholds,
) -> LeadSelector {
    match status {
        None => LeadSelector::all_for_owner(owner_id),
        Some(status) => match anchor_window(status, now, thresholds) {
            Some(window) => LeadSelector::non_terminal_in_window(owner_id, &window),
            // No window means the status is terminal and matched by its
            // stored column, not by timestamps.
            None => LeadSelector::terminal(owner_id, status.as_str()),
        },
    }
}

/// Attach the derived pipeline fields to a stored row.
fn present_lead(row: DbLead, now: DateTime<Utc>, thresholds: &StatusThresholds) -> Lead {
    let derived = derive_status(
        &row.imported_at,
        row.last_contacted_at.as_deref(),
        row.terminal_status.as_deref(),
        row.terminal_at.as_deref(),
        now,
        thresholds,
    );
    Lead {
        id: row.id,
        owner_id: row.owner_id,
        first_name: row.first_name,
        last_name: row.last_name,
        phone: row.phone,
        email: row.email,
        goals: row.goals,
        notes: row.notes,
        imported_at: row.imported_at,
        last_contacted_at: row.last_contacted_at,
        status: derived.status,
        status_age_days: derived.age_days,
        updated_at: row.updated_at,
    }
}

/// Import a lead and return its id. `imported_at` is stamped once from
/// `now` and never changes afterwards.
pub fn import_lead(
    db: &LeadDb,
    owner_id: &str,
    request: NewLead,
    now: DateTime<Utc>,
) -> Result<String, CoreError> {
    validate_id_slug(owner_id, "ownerId")?;
    let first_name = normalize_detail(request.first_name, "firstName", 200)?;
    let last_name = normalize_detail(request.last_name, "lastName", 200)?;
    let phone = normalize_detail(request.phone, "phone", 200)?;
    let email = normalize_detail(request.email, "email", 200)?;
    let goals = normalize_detail(request.goals, "goals", 2000)?;
    let notes = normalize_detail(request.notes, "notes", 2000)?;
    if first_name.is_none() && last_name.is_none() && phone.is_none() && email.is_none() {
        return Err(CoreError::invalid(
            "lead",
            "at least one of firstName, lastName, phone, email is required",
        ));
    }

    let stamp = fmt_utc(now);
    let id = Uuid::new_v4().to_string();
    db.insert_lead(&DbLead {
        id: id.clone(),
        owner_id: owner_id.to_string(),
        first_name,
        last_name,
        phone,
        email,
        goals,
        notes,
        imported_at: stamp.clone(),
        last_contacted_at: None,
        terminal_status: None,
        terminal_at: None,
        updated_at: stamp,
    })?;
    Ok(id)
}

/// Fetch one lead with its derived status at `now`.
pub fn get_lead(
    db: &LeadDb,
    config: &Config,
    owner_id: &str,
    id: &str,
    now: DateTime<Utc>,
) -> Result<Lead, CoreError> {
    validate_id_slug(owner_id, "ownerId")?;
    validate_id_slug(id, "leadId")?;
    let row = db
        .get_lead(owner_id, id)?
        .ok_or_else(|| CoreError::not_found("lead", id))?;
    Ok(present_lead(row, now, &config.status_thresholds))
}

/// Replace the contact-detail fields of a lead.
pub fn update_lead_details(
    db: &LeadDb,
    owner_id: &str,
    id: &str,
    request: UpdateLeadDetails,
    now: DateTime<Utc>,
) -> Result<(), CoreError> {
    validate_id_slug(owner_id, "ownerId")?;
    validate_id_slug(id, "leadId")?;
    let first_name = normalize_detail(request.first_name, "firstName", 200)?;
    let last_name = normalize_detail(request.last_name, "lastName", 200)?;
    let phone = normalize_detail(request.phone, "phone", 200)?;
    let email = normalize_detail(request.email, "email", 200)?;
    let goals = normalize_detail(request.goals, "goals", 2000)?;
    let notes = normalize_detail(request.notes, "notes", 2000)?;

    let details = LeadDetails {
        first_name: first_name.as_deref(),
        last_name: last_name.as_deref(),
        phone: phone.as_deref(),
        email: email.as_deref(),
        goals: goals.as_deref(),
        notes: notes.as_deref(),
    };
    if !db.update_lead_details(owner_id, id, &details, &fmt_utc(now))? {
        return Err(CoreError::not_found("lead", id));
    }
    Ok(())
}

/// Record a contact point and advance the lead's contact anchor. The insert
/// and the anchor touch commit together or not at all. Returns the contact
/// point id.
pub fn record_contact(
    db: &LeadDb,
    owner_id: &str,
    request: NewContactPoint,
    now: DateTime<Utc>,
) -> Result<String, CoreError> {
    validate_id_slug(owner_id, "ownerId")?;
    validate_id_slug(&request.lead_id, "leadId")?;
    let kind = ContactKind::parse(&request.kind)?;
    let note = normalize_detail(request.note, "note", 2000)?;
    let occurred_at = match request.occurred_at.as_deref() {
        Some(value) => parse_utc(value, "occurredAt")?,
        None => now,
    };

    db.get_lead(owner_id, &request.lead_id)?
        .ok_or_else(|| CoreError::not_found("lead", request.lead_id.as_str()))?;

    let stamp = fmt_utc(now);
    let contact = DbContactPoint {
        id: Uuid::new_v4().to_string(),
        owner_id: owner_id.to_string(),
        lead_id: request.lead_id.clone(),
        kind: kind.as_str().to_string(),
        note,
        occurred_at: fmt_utc(occurred_at),
        created_at: stamp.clone(),
    };
    db.with_transaction(|db| {
        db.insert_contact_point(&contact)?;
        db.touch_last_contacted(owner_id, &request.lead_id, &contact.occurred_at, &stamp)?;
        Ok(())
    })?;
    Ok(contact.id)
}

/// Contact points for a lead, most recent first.
pub fn contact_history(
    db: &LeadDb,
    owner_id: &str,
    lead_id: &str,
) -> Result<Vec<DbContactPoint>, CoreError> {
    validate_id_slug(owner_id, "ownerId")?;
    validate_id_slug(lead_id, "leadId")?;
    db.get_lead(owner_id, lead_id)?
        .ok_or_else(|| CoreError::not_found("lead", lead_id))?;
    Ok(db.list_contact_points(owner_id, lead_id)?)
}

fn record_terminal(
    db: &LeadDb,
    owner_id: &str,
    id: &str,
    status: LeadStatus,
    now: DateTime<Utc>,
) -> Result<(), CoreError> {
    validate_id_slug(owner_id, "ownerId")?;
    validate_id_slug(id, "leadId")?;
    let stamp = fmt_utc(now);
    if !db.set_terminal_status(owner_id, id, status.as_str(), &stamp, &stamp)? {
        return Err(CoreError::not_found("lead", id));
    }
    Ok(())
}

/// Record the `converted` outcome. Repeat calls keep the original instant;
/// switching from another terminal status stamps a fresh one.
pub fn mark_converted(
    db: &LeadDb,
    owner_id: &str,
    id: &str,
    now: DateTime<Utc>,
) -> Result<(), CoreError> {
    record_terminal(db, owner_id, id, LeadStatus::Converted, now)
}

/// Record the `not_interested` outcome.
pub fn mark_not_interested(
    db: &LeadDb,
    owner_id: &str,
    id: &str,
    now: DateTime<Utc>,
) -> Result<(), CoreError> {
    record_terminal(db, owner_id, id, LeadStatus::NotInterested, now)
}

/// Clear a terminal status; time-based derivation resumes from the stored
/// timestamps.
pub fn reopen_lead(
    db: &LeadDb,
    owner_id: &str,
    id: &str,
    now: DateTime<Utc>,
) -> Result<(), CoreError> {
    validate_id_slug(owner_id, "ownerId")?;
    validate_id_slug(id, "leadId")?;
    if !db.clear_terminal_status(owner_id, id, &fmt_utc(now))? {
        return Err(CoreError::not_found("lead", id));
    }
    Ok(())
}

/// Delete a lead with its tasks, consultations, and contact points.
pub fn delete_lead(db: &LeadDb, owner_id: &str, id: &str) -> Result<(), CoreError> {
    validate_id_slug(owner_id, "ownerId")?;
    validate_id_slug(id, "leadId")?;
    if !db.delete_lead_cascading(owner_id, id)? {
        return Err(CoreError::not_found("lead", id));
    }
    Ok(())
}

/// One page of leads, newest import first, with statuses derived at `now`.
/// The total count is computed for page zero only.
pub fn list_leads(
    db: &LeadDb,
    config: &Config,
    owner_id: &str,
    query: LeadQuery,
    now: DateTime<Utc>,
) -> Result<Page<Lead>, CoreError> {
    validate_id_slug(owner_id, "ownerId")?;
    let status = match query.status.as_deref() {
        Some(token) => Some(LeadStatus::parse(token)?),
        None => None,
    };
    let request = page_request(query.page, query.page_size, config)?;
    let selector = selector_for(owner_id, status, now, &config.status_thresholds);

    let rows = db.list_leads_page(&selector, request.offset(), request.fetch_limit())?;
    let (rows, has_next_page) = request.take_page(rows);
    let total_count = if request.is_first() {
        Some(db.count_leads(&selector)?)
    } else {
        None
    };

    let items = rows
        .into_iter()
        .map(|row| present_lead(row, now, &config.status_thresholds))
        .collect();
    Ok(Page {
        items,
        has_next_page,
        total_count,
    })
}

/// Lead counts per derived status at `now`. Uses the same selectors as
/// [`list_leads`], so each bucket equals the total of the corresponding
/// filtered listing and the buckets sum to `total`.
pub fn status_counts(
    db: &LeadDb,
    config: &Config,
    owner_id: &str,
    now: DateTime<Utc>,
) -> Result<LeadStatusCounts, CoreError> {
    validate_id_slug(owner_id, "ownerId")?;
    let thresholds = &config.status_thresholds;
    let mut counts = LeadStatusCounts {
        new: 0,
        warm: 0,
        cold: 0,
        converted: 0,
        not_interested: 0,
        total: db.count_leads(&selector_for(owner_id, None, now, thresholds))?,
    };
    for status in LeadStatus::ALL {
        let n = db.count_leads(&selector_for(owner_id, Some(status), now, thresholds))?;
        match status {
            LeadStatus::New => counts.new = n,
            LeadStatus::Warm => counts.warm = n,
            LeadStatus::Cold => counts.cold = n,
            LeadStatus::Converted => counts.converted = n,
            LeadStatus::NotInterested => counts.not_interested = n,
        }
    }
    Ok(counts)
}
