// ── Report Composer ──
//
// Weekly summary of a site's maintenance log, rendered as an e-mail.

use std::fmt::Write as _;

use bytesize::ByteSize;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{MaintenanceLogEntry, Outcome, Site, SiteId, TaskKind, TaskResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeoSummary {
    pub score: u8,
    pub top_suggestion: Option<String>,
    pub audited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupSummary {
    pub outcome: Outcome,
    pub locator: Option<String>,
    pub size_bytes: Option<u64>,
    pub message: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyReport {
    pub site_id: SiteId,
    pub site_name: String,
    pub deploy_url: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub uptime_checks: u32,
    pub uptime_successes: u32,
    pub seo: Option<SeoSummary>,
    pub backup: Option<BackupSummary>,
}

impl WeeklyReport {
    /// Summarize `entries` (the caller's reporting window) for `site`.
    pub fn compose(site: &Site, entries: &[MaintenanceLogEntry], now: DateTime<Utc>) -> Self {
        let mut checks = 0u32;
        let mut successes = 0u32;
        let mut seo = None;
        let mut backup = None;

        let mut ordered: Vec<&MaintenanceLogEntry> =
            entries.iter().filter(|e| e.site_id == site.id).collect();
        ordered.sort_by_key(|e| e.created_at);

        for entry in ordered {
            match (entry.kind, &entry.result) {
                (TaskKind::Uptime, _) => {
                    checks = checks.saturating_add(1);
                    if entry.is_success() {
                        successes = successes.saturating_add(1);
                    }
                }
                (TaskKind::Seo, TaskResult::Seo(audit)) => {
                    seo = Some(SeoSummary {
                        score: audit.score,
                        top_suggestion: audit.suggestions.first().cloned(),
                        audited_at: entry.created_at,
                    });
                }
                (TaskKind::Backup, result) => {
                    let (locator, size_bytes, message) = match result {
                        TaskResult::Backup(b) => (Some(b.locator.clone()), Some(b.size_bytes), None),
                        TaskResult::Error { message } => (None, None, Some(message.clone())),
                        _ => (None, None, None),
                    };
                    backup = Some(BackupSummary {
                        outcome: entry.outcome,
                        locator,
                        size_bytes,
                        message,
                        attempted_at: entry.created_at,
                    });
                }
                (TaskKind::Seo, _) => {}
            }
        }

        Self {
            site_id: site.id.clone(),
            site_name: site.name.clone(),
            deploy_url: site.deploy_url().map(str::to_owned),
            generated_at: now,
            uptime_checks: checks,
            uptime_successes: successes,
            seo,
            backup,
        }
    }

    /// Share of successful probes; 100 when nothing was probed.
    pub fn uptime_percentage(&self) -> f64 {
        if self.uptime_checks == 0 {
            return 100.0;
        }
        f64::from(self.uptime_successes) * 100.0 / f64::from(self.uptime_checks)
    }

    pub fn render_subject(&self) -> String {
        format!("Weekly maintenance report: {}", self.site_name)
    }

    pub fn render_html(&self) -> String {
        let mut html = String::new();
        let name = escape_html(&self.site_name);
        let _ = write!(
            html,
            "<h2>Weekly report for {name}</h2>\n<p>Generated {}</p>\n<ul>\n",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        );
        if let Some(url) = &self.deploy_url {
            let url = escape_html(url);
            let _ = writeln!(html, "<li>Site: <a href=\"{url}\">{url}</a></li>");
        }
        let _ = writeln!(
            html,
            "<li>Uptime: {:.1}% ({} of {} checks passed)</li>",
            self.uptime_percentage(),
            self.uptime_successes,
            self.uptime_checks
        );

        match &self.seo {
            Some(seo) => {
                let _ = writeln!(html, "<li>SEO score: {}/100</li>", seo.score);
                if let Some(tip) = &seo.top_suggestion {
                    let _ = writeln!(html, "<li>Top suggestion: {}</li>", escape_html(tip));
                }
            }
            None => html.push_str("<li>SEO score: no audit this week</li>\n"),
        }

        match &self.backup {
            Some(b) if b.outcome.is_success() => {
                let size = b.size_bytes.map(|n| ByteSize(n).to_string()).unwrap_or_default();
                let _ = writeln!(
                    html,
                    "<li>Latest backup: succeeded on {} ({size})</li>",
                    b.attempted_at.format("%Y-%m-%d")
                );
            }
            Some(b) => {
                let reason = b.message.as_deref().map(escape_html).unwrap_or_default();
                let _ = writeln!(
                    html,
                    "<li>Latest backup: failed on {} {reason}</li>",
                    b.attempted_at.format("%Y-%m-%d")
                );
            }
            None => html.push_str("<li>Latest backup: none this week</li>\n"),
        }

        html.push_str("</ul>\n");
        html
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
