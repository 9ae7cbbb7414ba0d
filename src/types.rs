//! Domain enums and read models for the lead pipeline.
//!
//! Pipeline status is a closed enum with an explicit stage ranking, never a
//! free-form string. The derived fields on [`Lead`] (`status`,
//! `status_age_days`) are recomputed on every read and never persisted.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Pipeline stage of a lead, derived from elapsed time unless a terminal
/// stage was recorded by explicit action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Warm,
    Cold,
    Converted,
    NotInterested,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 5] = [
        LeadStatus::New,
        LeadStatus::Warm,
        LeadStatus::Cold,
        LeadStatus::Converted,
        LeadStatus::NotInterested,
    ];

    /// String label for SQL storage and query tokens.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Warm => "warm",
            LeadStatus::Cold => "cold",
            LeadStatus::Converted => "converted",
            LeadStatus::NotInterested => "not_interested",
        }
    }

    /// Parse a caller-supplied status token.
    pub fn parse(token: &str) -> Result<Self, CoreError> {
        match token {
            "new" => Ok(LeadStatus::New),
            "warm" => Ok(LeadStatus::Warm),
            "cold" => Ok(LeadStatus::Cold),
            "converted" => Ok(LeadStatus::Converted),
            "not_interested" => Ok(LeadStatus::NotInterested),
            other => Err(CoreError::invalid(
                "status",
                format!("unknown status: {other}"),
            )),
        }
    }

    /// Stage ordering: advancing time never moves a lead to a lower rank
    /// while its timestamps and terminal state are held fixed.
    pub fn rank(&self) -> u8 {
        match self {
            LeadStatus::New => 0,
            LeadStatus::Warm => 1,
            LeadStatus::Cold => 2,
            LeadStatus::Converted => 3,
            LeadStatus::NotInterested => 4,
        }
    }

    /// Terminal stages are set by explicit mutation and are never overridden
    /// by time-based derivation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeadStatus::Converted | LeadStatus::NotInterested)
    }
}

/// Named time-window predicate over the due/scheduled instant of a task or
/// consultation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DueFilter {
    Today,
    Overdue,
    Upcoming,
    All,
}

impl DueFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            DueFilter::Today => "today",
            DueFilter::Overdue => "overdue",
            DueFilter::Upcoming => "upcoming",
            DueFilter::All => "all",
        }
    }

    /// Parse a caller-supplied filter token.
    pub fn parse(token: &str) -> Result<Self, CoreError> {
        match token {
            "today" => Ok(DueFilter::Today),
            "overdue" => Ok(DueFilter::Overdue),
            "upcoming" => Ok(DueFilter::Upcoming),
            "all" => Ok(DueFilter::All),
            other => Err(CoreError::invalid(
                "filter",
                format!("unknown filter: {other}"),
            )),
        }
    }

    /// The status restriction a bucket actually applies, combined with the
    /// caller's explicit restriction. `overdue` only ever matches pending
    /// work; paired with an explicit `completed` restriction it can match
    /// nothing at all, signalled by `None`.
    pub fn combine_status(
        self,
        status: Option<ScheduleStatus>,
    ) -> Option<Option<ScheduleStatus>> {
        match (self, status) {
            (DueFilter::Overdue, Some(ScheduleStatus::Completed)) => None,
            (DueFilter::Overdue, _) => Some(Some(ScheduleStatus::Pending)),
            (_, explicit) => Some(explicit),
        }
    }
}

/// Lifecycle status of a task or consultation. Explicit, not derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Pending,
    Completed,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "pending",
            ScheduleStatus::Completed => "completed",
        }
    }

    pub fn parse(token: &str) -> Result<Self, CoreError> {
        match token {
            "pending" => Ok(ScheduleStatus::Pending),
            "completed" => Ok(ScheduleStatus::Completed),
            other => Err(CoreError::invalid(
                "status",
                format!("unknown status: {other}"),
            )),
        }
    }
}

/// How a contact point happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    Call,
    Text,
    Email,
    Meeting,
    Other,
}

impl ContactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactKind::Call => "call",
            ContactKind::Text => "text",
            ContactKind::Email => "email",
            ContactKind::Meeting => "meeting",
            ContactKind::Other => "other",
        }
    }

    pub fn parse(token: &str) -> Result<Self, CoreError> {
        match token {
            "call" => Ok(ContactKind::Call),
            "text" => Ok(ContactKind::Text),
            "email" => Ok(ContactKind::Email),
            "meeting" => Ok(ContactKind::Meeting),
            "other" => Ok(ContactKind::Other),
            other => Err(CoreError::invalid("kind", format!("unknown kind: {other}"))),
        }
    }
}

/// Lead read model: the stored row plus the derived pipeline fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub owner_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub imported_at: String,
    pub last_contacted_at: Option<String>,
    /// Derived at read time; never stored.
    pub status: LeadStatus,
    /// Days since the timestamp that determined `status`. Never negative.
    pub status_age_days: i64,
    pub updated_at: String,
}

/// Per-status lead counts for an owner. `total` is the owner's full lead
/// count; the five buckets always sum to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadStatusCounts {
    pub new: i64,
    pub warm: i64,
    pub cold: i64,
    pub converted: i64,
    pub not_interested: i64,
    pub total: i64,
}

impl LeadStatusCounts {
    pub fn sum(&self) -> i64 {
        self.new + self.warm + self.cold + self.converted + self.not_interested
    }
}

/// Per-bucket schedule counts for an owner and optional status restriction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueFilterCounts {
    pub today: i64,
    pub overdue: i64,
    pub upcoming: i64,
    pub all: i64,
}
