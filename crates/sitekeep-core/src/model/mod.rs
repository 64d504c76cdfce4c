// ── Domain model ──

pub mod log_entry;
pub mod site;
pub mod task;

pub use log_entry::{BackupRecord, MaintenanceLogEntry, SeoAudit, TaskResult, UptimeProbe};
pub use site::{BillingStatus, Plan, Site, SiteId, SiteMeta, SiteMetaPatch, SiteStatus};
pub use task::{Outcome, TaskKind, TaskSet, Trigger};
