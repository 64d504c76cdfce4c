//! CLI error types with miette diagnostics.
//!
//! Wraps config, persistence, and scheduler failures with actionable help
//! text and maps each to a process exit code.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use sitekeep_config::ConfigError;
use sitekeep_core::{CoreError, StoreError};

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const NOT_FOUND: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Startup ──────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(sitekeep::config),
        help("Check the file given with --config (or the platform default) and SITEKEEP_* variables.")
    )]
    Config(#[from] ConfigError),

    #[error("Persistence unavailable: {0}")]
    #[diagnostic(
        code(sitekeep::store),
        help("Check [store] sites_path and journal_path in the config file.")
    )]
    Store(#[from] StoreError),

    #[error("Maintenance pass failed: {0}")]
    #[diagnostic(code(sitekeep::pass))]
    Pass(#[from] CoreError),

    #[error("HTTP client setup failed: {0}")]
    #[diagnostic(code(sitekeep::http))]
    Http(#[from] sitekeep_api::Error),

    #[error("Invalid {cadence} cron expression \"{expr}\"")]
    #[diagnostic(
        code(sitekeep::config),
        help("Cron expressions take 6 fields, seconds first: \"0 0 2 * * SUN\".")
    )]
    InvalidCron {
        cadence: &'static str,
        expr: String,
        #[source]
        source: tokio_cron_scheduler::JobSchedulerError,
    },

    #[error("Scheduler error: {0}")]
    #[diagnostic(code(sitekeep::scheduler))]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),

    // ── Commands ─────────────────────────────────────────────────────
    #[error("Site '{id}' not found")]
    #[diagnostic(
        code(sitekeep::not_found),
        help("Site ids are listed in the sites file configured under [store].")
    )]
    SiteNotFound { id: String },

    #[error("Cannot run {kind} for '{id}': {source}")]
    #[diagnostic(
        code(sitekeep::task),
        help("On-demand tasks need a deployed site with a deployment URL.")
    )]
    Task {
        kind: String,
        id: String,
        #[source]
        source: CoreError,
    },

    #[error("Cannot read bundle {}", path.display())]
    #[diagnostic(code(sitekeep::bundle))]
    Bundle {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SiteNotFound { .. } => exit_code::NOT_FOUND,
            _ => exit_code::GENERAL,
        }
    }
}
