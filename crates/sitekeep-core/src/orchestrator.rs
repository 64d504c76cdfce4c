// ── Maintenance Orchestrator ──
//
// One pass sweeps every deployed site: the policy gate decides which task
// kinds apply, the log decides which are due, and every attempt lands in
// the log as exactly one entry. Task failures are recorded, never raised.
// Concurrent passes may both see a task as due; the extra run is accepted.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use sitekeep_api::{Recommender, ReportMailer, SiteFetcher};
use tracing::{debug, error, info, warn};

use crate::analyzer;
use crate::backup::BackupProducer;
use crate::config::{MaintenanceConfig, to_delta};
use crate::error::CoreError;
use crate::model::{
    MaintenanceLogEntry, SeoAudit, Site, SiteId, SiteMetaPatch, SiteStatus, TaskKind, TaskSet,
    Trigger, UptimeProbe,
};
use crate::policy;
use crate::report::WeeklyReport;
use crate::store::Store;

// ── Scope ───────────────────────────────────────────────────────────

/// Which task kinds (and whether the weekly report) a pass covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassScope {
    tasks: TaskSet,
    reports: bool,
}

impl PassScope {
    /// Every task kind plus reports. Used for the startup pass.
    pub fn full() -> Self {
        Self {
            tasks: TaskSet::all(),
            reports: true,
        }
    }

    /// A single cadence.
    pub fn only(kind: TaskKind) -> Self {
        Self {
            tasks: TaskSet::from([kind]),
            reports: false,
        }
    }

    pub fn with_reports(mut self) -> Self {
        self.reports = true;
        self
    }

    pub fn tasks(&self) -> &TaskSet {
        &self.tasks
    }

    pub fn includes_reports(&self) -> bool {
        self.reports
    }
}

// ── Summary ─────────────────────────────────────────────────────────

/// Counters for one finished pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    /// Eligible sites considered.
    pub sites: usize,
    /// Sites with no enabled task kinds.
    pub skipped: usize,
    pub entries_written: usize,
    pub failures: usize,
    pub reports_sent: usize,
}

impl PassSummary {
    fn absorb(&mut self, other: &Self) {
        self.sites += other.sites;
        self.skipped += other.skipped;
        self.entries_written += other.entries_written;
        self.failures += other.failures;
        self.reports_sent += other.reports_sent;
    }
}

/// Whether a task whose latest entry is `latest` should run at `now`.
/// The boundary is inclusive: an entry exactly `interval` old is due.
pub fn is_due(
    latest: Option<&MaintenanceLogEntry>,
    now: DateTime<Utc>,
    interval: TimeDelta,
) -> bool {
    latest.is_none_or(|entry| now - entry.created_at >= interval)
}

// ── Orchestrator ────────────────────────────────────────────────────

pub struct Orchestrator {
    store: Arc<dyn Store>,
    fetcher: SiteFetcher,
    backups: BackupProducer,
    recommender: Option<Arc<dyn Recommender>>,
    mailer: Option<Arc<dyn ReportMailer>>,
    config: MaintenanceConfig,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn Store>,
        fetcher: SiteFetcher,
        backups: BackupProducer,
        config: MaintenanceConfig,
    ) -> Self {
        Self {
            store,
            fetcher,
            backups,
            recommender: None,
            mailer: None,
            config,
        }
    }

    pub fn with_recommender(mut self, recommender: Arc<dyn Recommender>) -> Self {
        self.recommender = Some(recommender);
        self
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn ReportMailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn config(&self) -> &MaintenanceConfig {
        &self.config
    }

    /// Run one pass over all deployed sites.
    ///
    /// Fails only when the site listing cannot be read.
    pub async fn run_pass(
        &self,
        trigger: Trigger,
        scope: &PassScope,
    ) -> Result<PassSummary, CoreError> {
        let started = Instant::now();
        let listed = self.store.find_sites_by_status(SiteStatus::Deployed).await?;

        let mut seen = HashSet::new();
        let sites: Vec<Site> = listed
            .into_iter()
            .filter(Site::is_maintainable)
            .filter(|s| seen.insert(s.id.clone()))
            .collect();

        info!(%trigger, sites = sites.len(), tasks = ?scope.tasks(), "maintenance pass started");

        let limit = self.config.max_concurrent_sites.max(1);
        let summary = stream::iter(sites)
            .map(|site| self.maintain_site(site, trigger, scope))
            .buffer_unordered(limit)
            .fold(PassSummary::default(), |mut acc, site_summary| async move {
                acc.absorb(&site_summary);
                acc
            })
            .await;

        info!(
            %trigger,
            sites = summary.sites,
            skipped = summary.skipped,
            entries = summary.entries_written,
            failures = summary.failures,
            reports = summary.reports_sent,
            elapsed_ms = started.elapsed().as_millis(),
            "maintenance pass finished"
        );
        Ok(summary)
    }

    /// Run one task kind for one site now, outside any pass. The policy
    /// gate and due check do not apply. Exactly one entry is recorded and
    /// returned, whatever the task outcome.
    pub async fn run_task(
        &self,
        site_id: &SiteId,
        kind: TaskKind,
        trigger: Trigger,
    ) -> Result<MaintenanceLogEntry, CoreError> {
        let site = self
            .store
            .get_site(site_id)
            .await?
            .ok_or_else(|| CoreError::SiteNotFound {
                id: site_id.to_string(),
            })?;
        let Some(url) = site
            .deploy_url()
            .filter(|_| site.is_maintainable())
            .map(str::to_owned)
        else {
            return Err(CoreError::NotDeployed {
                id: site_id.to_string(),
            });
        };

        let (entry, patch) = match kind {
            TaskKind::Uptime => (self.check_uptime(&site, &url, trigger).await, None),
            TaskKind::Backup => (self.run_backup(&site, &url, trigger).await, None),
            TaskKind::Seo => self.audit_seo(&site, &url, trigger).await,
        };
        self.store.append_log_entry(entry.clone()).await?;
        if let Some(patch) = patch {
            self.update_meta(&site.id, patch).await;
        }

        info!(site_id = %site.id, %kind, %trigger, outcome = %entry.outcome, "task finished");
        Ok(entry)
    }

    async fn maintain_site(&self, site: Site, trigger: Trigger, scope: &PassScope) -> PassSummary {
        let mut summary = PassSummary {
            sites: 1,
            ..PassSummary::default()
        };

        let enabled = policy::enabled_tasks(site.plan, site.billing_status);
        if enabled.is_empty() {
            debug!(site_id = %site.id, plan = %site.plan, billing = %site.billing_status, "no maintenance enabled");
            summary.skipped = 1;
            return summary;
        }
        let Some(url) = site.deploy_url().map(str::to_owned) else {
            summary.skipped = 1;
            return summary;
        };
        let tasks = enabled.intersection(scope.tasks());

        if tasks.contains(TaskKind::Uptime) {
            let entry = self.check_uptime(&site, &url, trigger).await;
            self.record(entry, &mut summary).await;
        }

        if tasks.contains(TaskKind::Backup) && self.due(&site, TaskKind::Backup).await {
            let entry = self.run_backup(&site, &url, trigger).await;
            self.record(entry, &mut summary).await;
        }

        if tasks.contains(TaskKind::Seo) && self.due(&site, TaskKind::Seo).await {
            let (entry, patch) = self.audit_seo(&site, &url, trigger).await;
            self.record(entry, &mut summary).await;
            if let Some(patch) = patch {
                self.update_meta(&site.id, patch).await;
            }
        }

        if scope.includes_reports() && self.send_report(&site).await {
            summary.reports_sent = 1;
        }

        summary
    }

    async fn due(&self, site: &Site, kind: TaskKind) -> bool {
        let interval = match kind {
            TaskKind::Backup => self.config.backup_interval,
            TaskKind::Seo => self.config.seo_interval,
            TaskKind::Uptime => Duration::ZERO,
        };
        match self.store.latest_log_entry(&site.id, kind).await {
            Ok(latest) => {
                let due = is_due(latest.as_ref(), Utc::now(), to_delta(interval));
                debug!(site_id = %site.id, %kind, due, "due check");
                due
            }
            Err(e) => {
                warn!(site_id = %site.id, %kind, error = %e, "cannot read log, skipping task");
                false
            }
        }
    }

    async fn check_uptime(&self, site: &Site, url: &str, trigger: Trigger) -> MaintenanceLogEntry {
        let checked_at = Utc::now();
        let started = Instant::now();
        let probe = match self.fetcher.probe(url).await {
            Ok(resp) => UptimeProbe {
                status_code: Some(resp.status),
                ok: resp.is_healthy(),
                duration_ms: millis(resp.duration),
                message: None,
                checked_at,
            },
            Err(e) => {
                let message = CoreError::from(e).to_string();
                warn!(site_id = %site.id, kind = "uptime", %trigger, error = %message, "probe failed");
                UptimeProbe {
                    status_code: None,
                    ok: false,
                    duration_ms: millis(started.elapsed()),
                    message: Some(message),
                    checked_at,
                }
            }
        };
        MaintenanceLogEntry::uptime(site.id.clone(), trigger, probe)
    }

    async fn run_backup(&self, site: &Site, url: &str, trigger: Trigger) -> MaintenanceLogEntry {
        match self.backups.backup(&site.id, url).await {
            Ok(record) => MaintenanceLogEntry::backup(site.id.clone(), trigger, record),
            Err(e) => {
                warn!(site_id = %site.id, kind = "backup", %trigger, error = %e, "task failed");
                MaintenanceLogEntry::failure(site.id.clone(), TaskKind::Backup, trigger, e.to_string())
            }
        }
    }

    /// The SEO entry, plus the meta patch to apply once it is recorded.
    async fn audit_seo(
        &self,
        site: &Site,
        url: &str,
        trigger: Trigger,
    ) -> (MaintenanceLogEntry, Option<SiteMetaPatch>) {
        let analysis = match analyzer::analyze_url(&self.fetcher, url).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(site_id = %site.id, kind = "seo", %trigger, error = %e, "task failed");
                let entry =
                    MaintenanceLogEntry::failure(site.id.clone(), TaskKind::Seo, trigger, e.to_string());
                return (entry, None);
            }
        };

        let recommendation = self.recommend(site, &analysis).await;
        let audit = SeoAudit {
            score: analysis.seo_score,
            title: analysis.title.clone(),
            description: analysis.description.clone(),
            page_count: analysis.page_count,
            script_count: analysis.script_count,
            suggestions: analysis.suggestions(),
            recommendation,
        };
        let patch = analysis.meta_patch(site.meta.pages);
        (MaintenanceLogEntry::seo(site.id.clone(), trigger, audit), Some(patch))
    }

    async fn update_meta(&self, id: &SiteId, patch: SiteMetaPatch) {
        if let Err(e) = self.store.update_site_meta(id, patch).await {
            error!(site_id = %id, error = %e, "failed to update site meta");
        }
    }

    async fn recommend(&self, site: &Site, analysis: &analyzer::SiteAnalysis) -> Option<String> {
        let recommender = self.recommender.as_ref()?;
        let mut prompt_input = analysis.clone();
        prompt_input.favicon = None;
        let value = serde_json::to_value(&prompt_input).ok()?;
        match recommender.suggest(&value).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(site_id = %site.id, error = %e, "recommendation unavailable");
                None
            }
        }
    }

    /// Compose and send the weekly report. Returns whether a report went out.
    async fn send_report(&self, site: &Site) -> bool {
        if !policy::weekly_report_enabled(site.plan, site.billing_status) {
            return false;
        }
        let Some(mailer) = &self.mailer else {
            debug!(site_id = %site.id, "no mailer configured, skipping report");
            return false;
        };
        let Some(recipient) = site.contact_email.as_deref().filter(|r| !r.trim().is_empty())
        else {
            debug!(site_id = %site.id, "no contact address, skipping report");
            return false;
        };

        let now = Utc::now();
        let since = now - to_delta(self.config.report_window);
        let entries = match self.store.log_entries_since(&site.id, since).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(site_id = %site.id, error = %e, "cannot read log for report");
                return false;
            }
        };

        let report = WeeklyReport::compose(site, &entries, now);
        match mailer
            .send(recipient, &report.render_subject(), &report.render_html())
            .await
        {
            Ok(()) => {
                info!(site_id = %site.id, "weekly report sent");
                true
            }
            Err(e) => {
                warn!(site_id = %site.id, error = %e, "weekly report not sent");
                false
            }
        }
    }

    async fn record(&self, entry: MaintenanceLogEntry, summary: &mut PassSummary) {
        let (site_id, kind, success) = (entry.site_id.clone(), entry.kind, entry.is_success());
        match self.store.append_log_entry(entry).await {
            Ok(()) => {
                summary.entries_written += 1;
                if !success {
                    summary.failures += 1;
                }
            }
            Err(e) => {
                error!(%site_id, %kind, error = %e, "failed to write log entry");
                summary.failures += 1;
            }
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
