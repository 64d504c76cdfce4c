// ── Core error types ──
//
// Errors surfaced by the maintenance engine. Task-level failures never
// escape a pass; these types exist so the failure can be recorded with a
// meaningful message and so persistence outages can stop a pass early.
// The `From<sitekeep_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Persistence ──────────────────────────────────────────────────
    #[error(transparent)]
    Store(#[from] StoreError),

    // ── Remote site errors ───────────────────────────────────────────
    #[error("Cannot reach {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Failed to fetch deployed site ({status})")]
    HttpStatus { status: u16 },

    // ── Task errors ──────────────────────────────────────────────────
    #[error(transparent)]
    Backup(#[from] BackupError),

    #[error("Site not found: {id}")]
    SiteNotFound { id: String },

    #[error("Site {id} has no live deployment")]
    NotDeployed { id: String },

    // ── Collaborator errors (wrapped, not exposed raw) ───────────────
    #[error("{0}")]
    Collaborator(String),
}

/// Persistence-layer failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Persistence unavailable: {0}")]
    Unavailable(String),

    #[error("Site not found: {0}")]
    SiteNotFound(String),

    #[error("Corrupt record in {source_name} line {line}: {message}")]
    Corrupt {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of the Backup Producer.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("Cannot back up a site without a deployment URL")]
    MissingDeployUrl,

    #[error("Failed to download deployed site: {0}")]
    Fetch(#[source] sitekeep_api::Error),

    #[error("Failed to package archive: {0}")]
    Archive(String),

    #[error("Failed to store backup: {0}")]
    Storage(#[source] sitekeep_api::Error),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<sitekeep_api::Error> for CoreError {
    fn from(err: sitekeep_api::Error) -> Self {
        match err {
            sitekeep_api::Error::Transport(ref e) => {
                if let Some(status) = e.status() {
                    CoreError::HttpStatus {
                        status: status.as_u16(),
                    }
                } else {
                    // The client's own timeout is not visible here.
                    let reason = if e.is_timeout() {
                        "request timed out".to_owned()
                    } else {
                        e.to_string()
                    };
                    CoreError::Unreachable {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason,
                    }
                }
            }
            sitekeep_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            sitekeep_api::Error::Status { status, .. } => CoreError::HttpStatus { status },
            sitekeep_api::Error::InvalidUrl(e) => CoreError::Unreachable {
                url: String::new(),
                reason: format!("invalid URL: {e}"),
            },
            other => CoreError::Collaborator(other.to_string()),
        }
    }
}
