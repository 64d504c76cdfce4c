//! Maintenance engine for tenant-hosted static sites.
//!
//! - **[`Orchestrator`]** sweeps deployed sites, asks the [`policy`] gate
//!   which task kinds a subscription allows, consults the maintenance log to
//!   decide what is due, and records one [`MaintenanceLogEntry`] per attempt.
//! - **[`analyzer`]** derives SEO signals and a favicon from a site bundle
//!   or a single fetched document.
//! - **[`BackupProducer`]** archives a live deployment into object storage.
//! - **[`WeeklyReport`]** summarizes a trailing window of log entries.
//! - **[`store`]** holds the persistence seams and the in-memory and
//!   file-backed implementations.

pub mod analyzer;
pub mod backup;
pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod policy;
pub mod report;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use analyzer::{ExtractedFileSet, Favicon, SiteAnalysis, analyze, analyze_bundle, analyze_url};
pub use backup::BackupProducer;
pub use config::MaintenanceConfig;
pub use error::{BackupError, CoreError, StoreError};
pub use model::{
    BackupRecord, BillingStatus, MaintenanceLogEntry, Outcome, Plan, SeoAudit, Site, SiteId,
    SiteMeta, SiteMetaPatch, SiteStatus, TaskKind, TaskResult, TaskSet, Trigger, UptimeProbe,
};
pub use orchestrator::{Orchestrator, PassScope, PassSummary, is_due};
pub use policy::{enabled_tasks, weekly_report_enabled};
pub use report::WeeklyReport;
pub use store::{FileStore, MaintenanceLog, MemoryStore, SiteRepository, Store};
