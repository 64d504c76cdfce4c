// ── Maintenance log entries ──
//
// One immutable record per task attempt. The payload is keyed by task
// kind so readers (history, reports) get typed field access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::site::SiteId;
use super::task::{Outcome, TaskKind, Trigger};

/// Result of one uptime probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UptimeProbe {
    /// Final HTTP status. Absent when the request never got a response.
    pub status_code: Option<u16>,
    pub ok: bool,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub checked_at: DateTime<Utc>,
}

/// Where a backup archive landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Object key, `backups/{site_id}/{timestamp}.zip`.
    pub key: String,
    /// Public locator derived from the store's base URL and the key.
    pub locator: String,
    /// Filesystem-safe timestamp used in the key.
    pub timestamp: String,
    pub size_bytes: u64,
}

/// Result of an SEO re-audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoAudit {
    pub score: u8,
    pub title: String,
    pub description: String,
    pub page_count: u32,
    pub script_count: u32,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

/// Kind-specific payload of a log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskResult {
    Uptime(UptimeProbe),
    Backup(BackupRecord),
    Seo(SeoAudit),
    /// A backup or SEO attempt that failed before producing a result.
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceLogEntry {
    pub id: Uuid,
    pub site_id: SiteId,
    pub kind: TaskKind,
    pub outcome: Outcome,
    pub trigger: Trigger,
    pub result: TaskResult,
    pub created_at: DateTime<Utc>,
}

impl MaintenanceLogEntry {
    fn new(
        site_id: SiteId,
        kind: TaskKind,
        outcome: Outcome,
        trigger: Trigger,
        result: TaskResult,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            site_id,
            kind,
            outcome,
            trigger,
            result,
            created_at: Utc::now(),
        }
    }

    /// Record an uptime probe; the outcome follows `probe.ok`.
    pub fn uptime(site_id: SiteId, trigger: Trigger, probe: UptimeProbe) -> Self {
        let outcome = if probe.ok {
            Outcome::Success
        } else {
            Outcome::Fail
        };
        Self::new(
            site_id,
            TaskKind::Uptime,
            outcome,
            trigger,
            TaskResult::Uptime(probe),
        )
    }

    pub fn backup(site_id: SiteId, trigger: Trigger, record: BackupRecord) -> Self {
        Self::new(
            site_id,
            TaskKind::Backup,
            Outcome::Success,
            trigger,
            TaskResult::Backup(record),
        )
    }

    pub fn seo(site_id: SiteId, trigger: Trigger, audit: SeoAudit) -> Self {
        Self::new(
            site_id,
            TaskKind::Seo,
            Outcome::Success,
            trigger,
            TaskResult::Seo(audit),
        )
    }

    /// Record a failed attempt that produced no kind-specific payload.
    pub fn failure(
        site_id: SiteId,
        kind: TaskKind,
        trigger: Trigger,
        message: impl Into<String>,
    ) -> Self {
        Self::new(
            site_id,
            kind,
            Outcome::Fail,
            trigger,
            TaskResult::Error {
                message: message.into(),
            },
        )
    }

    /// Override the creation timestamp (journal replay, tests).
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// One-line human summary of the payload, used by history listings.
    pub fn summary(&self) -> String {
        match &self.result {
            TaskResult::Uptime(p) => match (p.status_code, &p.message) {
                (Some(code), _) => format!("HTTP {code} in {}ms", p.duration_ms),
                (None, Some(message)) => message.clone(),
                (None, None) => "no response".into(),
            },
            TaskResult::Backup(b) => b.locator.clone(),
            TaskResult::Seo(s) => format!("score {}", s.score),
            TaskResult::Error { message } => message.clone(),
        }
    }
}
