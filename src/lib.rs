//! Lead pipeline and scheduling core for personal trainers.
//!
//! Everything time-derived (pipeline status, due buckets, local-day
//! boundaries) is computed per request from an explicit `now`; SQLite holds
//! only recorded facts.

pub mod config;
pub mod db;
pub mod error;
pub mod page;
pub mod schedule;
pub mod services;
pub mod status;
pub mod types;
pub mod util;

mod migrations;

pub use config::{config_path, Config, StatusThresholds};
pub use db::{DbError, LeadDb};
pub use error::CoreError;
pub use page::{Page, PageRequest};
pub use schedule::{
    day_bounds, due_window, resolve_due_window, resolve_timezone, DayBounds, DueWindow,
};
pub use status::{derive_status, DerivedStatus};
pub use types::{
    ContactKind, DueFilter, DueFilterCounts, Lead, LeadStatus, LeadStatusCounts, ScheduleStatus,
};
