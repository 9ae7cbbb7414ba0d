//! Consultation scheduling: the same due-window machinery as tasks, plus an
//! outcome recorded at completion.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::Config;
use crate::db::{DbConsultation, LeadDb};
use crate::error::CoreError;
use crate::page::Page;
use crate::schedule::resolve_timezone;
use crate::types::{DueFilter, DueFilterCounts, ScheduleStatus};
use crate::util::{fmt_utc, parse_utc, validate_id_slug};

use super::{normalize_detail, page_request, schedule_selector, ScheduleQuery};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConsultation {
    pub lead_id: String,
    /// RFC3339 scheduled instant.
    pub scheduled_at: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Schedule a consultation with an existing lead. Returns the consultation
/// id.
pub fn schedule_consultation(
    db: &LeadDb,
    owner_id: &str,
    request: NewConsultation,
    now: DateTime<Utc>,
) -> Result<String, CoreError> {
    validate_id_slug(owner_id, "ownerId")?;
    validate_id_slug(&request.lead_id, "leadId")?;
    let scheduled_at = parse_utc(&request.scheduled_at, "scheduledAt")?;
    let location = normalize_detail(request.location, "location", 200)?;

    db.get_lead(owner_id, &request.lead_id)?
        .ok_or_else(|| CoreError::not_found("lead", request.lead_id.as_str()))?;

    let stamp = fmt_utc(now);
    let id = Uuid::new_v4().to_string();
    db.insert_consultation(&DbConsultation {
        id: id.clone(),
        owner_id: owner_id.to_string(),
        lead_id: request.lead_id,
        scheduled_at: fmt_utc(scheduled_at),
        location,
        status: ScheduleStatus::Pending.as_str().to_string(),
        outcome: None,
        completed_at: None,
        created_at: stamp.clone(),
        updated_at: stamp,
    })?;
    Ok(id)
}

/// Complete a consultation, recording an optional outcome. The first
/// completion counts as a contact with the lead; repeats return false and
/// keep the original outcome and instant.
pub fn complete_consultation(
    db: &LeadDb,
    owner_id: &str,
    id: &str,
    outcome: Option<&str>,
    now: DateTime<Utc>,
) -> Result<bool, CoreError> {
    validate_id_slug(owner_id, "ownerId")?;
    validate_id_slug(id, "consultationId")?;
    let outcome = normalize_detail(outcome.map(|s| s.to_string()), "outcome", 2000)?;
    let consultation = db
        .get_consultation(owner_id, id)?
        .ok_or_else(|| CoreError::not_found("consultation", id))?;

    let stamp = fmt_utc(now);
    let completed = db.with_transaction(|db| {
        let completed = db.complete_consultation(owner_id, id, outcome.as_deref(), &stamp)?;
        if completed {
            db.touch_last_contacted(owner_id, &consultation.lead_id, &stamp, &stamp)?;
        }
        Ok(completed)
    })?;
    Ok(completed)
}

pub fn delete_consultation(db: &LeadDb, owner_id: &str, id: &str) -> Result<(), CoreError> {
    validate_id_slug(owner_id, "ownerId")?;
    validate_id_slug(id, "consultationId")?;
    if !db.delete_consultation(owner_id, id)? {
        return Err(CoreError::not_found("consultation", id));
    }
    Ok(())
}

/// One page of consultations, soonest first, windowed exactly like
/// [`crate::services::tasks::list_tasks`].
pub fn list_consultations(
    db: &LeadDb,
    config: &Config,
    owner_id: &str,
    query: ScheduleQuery,
    now: DateTime<Utc>,
) -> Result<Page<DbConsultation>, CoreError> {
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

    let rows = db.list_consultations_page(&selector, request.offset(), request.fetch_limit())?;
    let (items, has_next_page) = request.take_page(rows);
    let total_count = if request.is_first() {
        Some(db.count_consultations(&selector)?)
    } else {
        None
    };
    Ok(Page {
        items,
        has_next_page,
        total_count,
    })
}

/// Consultation counts per due bucket, built on the listing's selector.
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
            Some(selector) => Ok(db.count_consultations(&selector)?),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::test_db;
    use crate::services::leads::{get_lead, import_lead, NewLead};
    use crate::types::LeadStatus;
    use chrono::Duration;

    const OWNER: &str = "owner-1";

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn fixture_lead(db: &LeadDb, now: DateTime<Utc>) -> String {
        let request = NewLead {
            first_name: Some("Ava".to_string()),
            ..Default::default()
        };
        import_lead(db, OWNER, request, now).unwrap()
    }

    fn scheduled(db: &LeadDb, lead_id: &str, when: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let request = NewConsultation {
            lead_id: lead_id.to_string(),
            scheduled_at: fmt_utc(when),
            location: Some("studio".to_string()),
        };
        schedule_consultation(db, OWNER, request, now).unwrap()
    }

    #[test]
    fn test_schedule_requires_existing_lead() {
        let db = test_db();
        let now = Utc::now();
        let request = NewConsultation {
            lead_id: "missing-lead".to_string(),
            scheduled_at: fmt_utc(now),
            location: None,
        };
        assert!(schedule_consultation(&db, OWNER, request, now)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_complete_records_outcome_once() {
        let db = test_db();
        let now = at("2025-06-01T08:00:00Z");
        let lead = fixture_lead(&db, now - Duration::days(3));
        let id = scheduled(&db, &lead, now - Duration::hours(2), now - Duration::days(3));

        assert!(complete_consultation(&db, OWNER, &id, Some("signed up"), now).unwrap());
        let row = db.get_consultation(OWNER, &id).unwrap().unwrap();
        assert_eq!(row.status, "completed");
        assert_eq!(row.outcome.as_deref(), Some("signed up"));
        assert_eq!(row.completed_at, Some(fmt_utc(now)));

        // A repeat completion changes nothing, including the outcome.
        let later = now + Duration::hours(4);
        assert!(!complete_consultation(&db, OWNER, &id, Some("changed mind"), later).unwrap());
        let row = db.get_consultation(OWNER, &id).unwrap().unwrap();
        assert_eq!(row.outcome.as_deref(), Some("signed up"));
        assert_eq!(row.completed_at, Some(fmt_utc(now)));
    }

    #[test]
    fn test_completion_touches_the_lead() {
        let db = test_db();
        let config = Config::default();
        let now = at("2025-06-01T08:00:00Z");
        let lead = fixture_lead(&db, now - Duration::days(20));
        let id = scheduled(&db, &lead, now - Duration::hours(1), now - Duration::days(20));

        complete_consultation(&db, OWNER, &id, None, now).unwrap();
        let refreshed = get_lead(&db, &config, OWNER, &lead, now).unwrap();
        assert_eq!(refreshed.status, LeadStatus::New);
        assert_eq!(refreshed.last_contacted_at, Some(fmt_utc(now)));
    }

    #[test]
    fn test_counts_match_listings() {
        let db = test_db();
        let config = Config::default();
        let now = at("2025-06-01T08:00:00Z");
        let lead = fixture_lead(&db, now - Duration::days(10));

        scheduled(&db, &lead, now - Duration::days(1), now - Duration::days(5));
        scheduled(&db, &lead, now + Duration::hours(2), now - Duration::days(5));
        scheduled(&db, &lead, now + Duration::days(3), now - Duration::days(5));

        let counts = filter_counts(&db, &config, OWNER, Some("pending"), None, now).unwrap();
        assert_eq!(counts.today, 1);
        assert_eq!(counts.overdue, 1);
        assert_eq!(counts.upcoming, 1);
        assert_eq!(counts.all, 3);
        assert_eq!(counts.today + counts.overdue + counts.upcoming, counts.all);

        for filter in ["today", "overdue", "upcoming", "all"] {
            let query = ScheduleQuery {
                filter: Some(filter.to_string()),
                status: Some("pending".to_string()),
                timezone: None,
                page: Some(0),
                page_size: Some(10),
            };
            let page = list_consultations(&db, &config, OWNER, query, now).unwrap();
            let expected = match filter {
                "today" => counts.today,
                "overdue" => counts.overdue,
                "upcoming" => counts.upcoming,
                _ => counts.all,
            };
            assert_eq!(page.total_count, Some(expected), "filter {}", filter);
        }
    }

    #[test]
    fn test_listing_orders_by_scheduled_instant() {
        let db = test_db();
        let config = Config::default();
        let now = at("2025-06-01T08:00:00Z");
        let lead = fixture_lead(&db, now);

        let third = scheduled(&db, &lead, now + Duration::days(3), now);
        let first = scheduled(&db, &lead, now + Duration::hours(1), now);
        let second = scheduled(&db, &lead, now + Duration::days(1), now);

        let query = ScheduleQuery {
            filter: None,
            status: None,
            timezone: None,
            page: Some(0),
            page_size: Some(10),
        };
        let page = list_consultations(&db, &config, OWNER, query, now).unwrap();
        let ids: Vec<&str> = page.items.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec![first.as_str(), second.as_str(), third.as_str()]);
    }
}
