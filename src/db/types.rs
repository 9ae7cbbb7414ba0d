//! Shared type definitions for the database layer.

use rusqlite::types::ToSql;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::status::AnchorWindow;
use crate::util::fmt_utc;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),
}

/// A row from the `leads` table. Stored fields only; derived pipeline status
/// lives on [`crate::types::Lead`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbLead {
    pub id: String,
    pub owner_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub goals: Option<String>,
    pub notes: Option<String>,
    pub imported_at: String,
    pub last_contacted_at: Option<String>,
    pub terminal_status: Option<String>,
    pub terminal_at: Option<String>,
    pub updated_at: String,
}

/// A row from the `tasks` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbTask {
    pub id: String,
    pub owner_id: String,
    pub lead_id: String,
    pub title: String,
    pub due_at: String,
    pub status: String,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the `consultations` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbConsultation {
    pub id: String,
    pub owner_id: String,
    pub lead_id: String,
    pub scheduled_at: String,
    pub location: Option<String>,
    pub status: String,
    pub outcome: Option<String>,
    pub completed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A row from the `contact_points` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbContactPoint {
    pub id: String,
    pub owner_id: String,
    pub lead_id: String,
    pub kind: String,
    pub note: Option<String>,
    pub occurred_at: String,
    pub created_at: String,
}

/// Contact-detail fields for a lead update. Timestamps and terminal state
/// are deliberately absent; those move through their own operations.
pub struct LeadDetails<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub goals: Option<&'a str>,
    pub notes: Option<&'a str>,
}

/// Bound parameter set for the shared lead predicate.
///
/// Every lead query (page, per-status count, total count) binds exactly this
/// set against the same SQL fragment, so a page and its counts can never
/// disagree about which rows match.
#[derive(Debug, Clone)]
pub struct LeadSelector {
    owner_id: String,
    terminal_status: Option<String>,
    non_terminal_flag: i64,
    anchor_after: Option<String>,
    anchor_through: Option<String>,
}

impl LeadSelector {
    /// Every lead the owner has, regardless of status.
    pub fn all_for_owner(owner_id: &str) -> Self {
        LeadSelector {
            owner_id: owner_id.to_string(),
            terminal_status: None,
            non_terminal_flag: 0,
            anchor_after: None,
            anchor_through: None,
        }
    }

    /// Leads with the given recorded terminal status.
    pub fn terminal(owner_id: &str, terminal_status: &str) -> Self {
        LeadSelector {
            owner_id: owner_id.to_string(),
            terminal_status: Some(terminal_status.to_string()),
            non_terminal_flag: 0,
            anchor_after: None,
            anchor_through: None,
        }
    }

    /// Non-terminal leads whose contact anchor falls inside the given window.
    /// The window bounds translate to `anchor > after AND anchor <= through`,
    /// mirroring how floor-day ages map back onto instants.
    pub fn non_terminal_in_window(owner_id: &str, window: &AnchorWindow) -> Self {
        LeadSelector {
            owner_id: owner_id.to_string(),
            terminal_status: None,
            non_terminal_flag: 1,
            anchor_after: window.after.map(fmt_utc),
            anchor_through: window.through.map(fmt_utc),
        }
    }

    pub(crate) fn bind(&self) -> [&dyn ToSql; 5] {
        [
            &self.owner_id,
            &self.terminal_status,
            &self.non_terminal_flag,
            &self.anchor_after,
            &self.anchor_through,
        ]
    }
}

/// Bound parameter set for the shared task/consultation predicate.
///
/// The due-window bounds are half-open: `due >= from AND due < before`.
#[derive(Debug, Clone)]
pub struct ScheduleSelector {
    owner_id: String,
    status: Option<String>,
    due_from: Option<String>,
    due_before: Option<String>,
}

impl ScheduleSelector {
    pub fn new(
        owner_id: &str,
        status: Option<&str>,
        due_from: Option<String>,
        due_before: Option<String>,
    ) -> Self {
        ScheduleSelector {
            owner_id: owner_id.to_string(),
            status: status.map(|s| s.to_string()),
            due_from,
            due_before,
        }
    }

    pub(crate) fn bind(&self) -> [&dyn ToSql; 4] {
        [&self.owner_id, &self.status, &self.due_from, &self.due_before]
    }
}
