//! The resident maintenance worker.
//!
//! Runs one startup pass over every task kind, then schedules the uptime,
//! backup, and SEO cadences. Passes triggered by the scheduler are tracked
//! so Ctrl-C lets in-flight work finish before exiting.

use std::sync::Arc;

use sitekeep_api::SiteFetcher;
use sitekeep_config::Config;
use sitekeep_core::{
    BackupProducer, FileStore, Orchestrator, PassScope, PassSummary, TaskKind, Trigger,
};
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::task::TaskTracker;
use tracing::{error, info};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, Field};

pub async fn run(once: bool, global: &GlobalOpts) -> Result<(), CliError> {
    let config = sitekeep_config::load_config(global.config.as_deref())?;
    let orchestrator = Arc::new(build_orchestrator(&config).await?);

    // Jobs are built first so a bad cron expression fails before any work.
    let tracker = TaskTracker::new();
    let jobs = cadences(&config)
        .into_iter()
        .map(|(cadence, cron, scope)| {
            cadence_job(cadence, cron, scope, Arc::clone(&orchestrator), tracker.clone())
        })
        .collect::<Result<Vec<_>, _>>()?;

    let summary = orchestrator
        .run_pass(Trigger::Startup, &PassScope::full())
        .await?;

    if once {
        let out = output::render_single(global.output, &summary, detail)?;
        output::print_output(&out);
        return Ok(());
    }

    let mut scheduler = JobScheduler::new().await?;
    for job in jobs {
        scheduler.add(job).await?;
    }
    scheduler.start().await?;
    info!(
        uptime = %config.schedule.uptime_cron,
        backup = %config.schedule.backup_cron,
        seo = %config.schedule.seo_cron,
        "worker scheduled"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested, waiting for in-flight passes");

    scheduler.shutdown().await?;
    tracker.close();
    tracker.wait().await;
    info!("worker stopped");
    Ok(())
}

pub(crate) async fn build_orchestrator(config: &Config) -> Result<Orchestrator, CliError> {
    let transport = config.transport_config();
    let (sites_path, journal_path) = config.store_paths();
    let store = Arc::new(FileStore::open(sites_path, journal_path).await?);

    let fetcher = SiteFetcher::new(&transport)?;
    let backups = BackupProducer::new(fetcher.clone(), config.object_store(&transport)?);
    let mut orchestrator =
        Orchestrator::new(store, fetcher, backups, config.maintenance_config()?);

    if let Some(mailer) = config.mailer(&transport)? {
        orchestrator = orchestrator.with_mailer(mailer);
    }
    if let Some(recommender) = config.recommender(&transport)? {
        orchestrator = orchestrator.with_recommender(recommender);
    }
    Ok(orchestrator)
}

/// Name, cron expression and pass scope per cadence. The SEO cadence also
/// carries the weekly report.
fn cadences(config: &Config) -> [(&'static str, String, PassScope); 3] {
    let s = &config.schedule;
    [
        ("uptime", s.uptime_cron.clone(), PassScope::only(TaskKind::Uptime)),
        ("backup", s.backup_cron.clone(), PassScope::only(TaskKind::Backup)),
        ("seo", s.seo_cron.clone(), PassScope::only(TaskKind::Seo).with_reports()),
    ]
}

fn cadence_job(
    cadence: &'static str,
    cron: String,
    scope: PassScope,
    orchestrator: Arc<Orchestrator>,
    tracker: TaskTracker,
) -> Result<Job, CliError> {
    let expr = cron.clone();
    Job::new_async(cron.as_str(), move |_uuid, _scheduler| {
        let orchestrator = Arc::clone(&orchestrator);
        let scope = scope.clone();
        let tracker = tracker.clone();
        Box::pin(async move {
            tracker.spawn(async move {
                if let Err(e) = orchestrator.run_pass(Trigger::Cron, &scope).await {
                    error!(error = %e, "scheduled pass failed");
                }
            });
        })
    })
    .map_err(|source| CliError::InvalidCron {
        cadence,
        expr,
        source,
    })
}

fn detail(summary: &PassSummary) -> String {
    output::render_table(&[
        Field::new("Sites", summary.sites),
        Field::new("Skipped", summary.skipped),
        Field::new("Entries written", summary.entries_written),
        Field::new("Failures", summary.failures),
        Field::new("Reports sent", summary.reports_sent),
    ])
}
