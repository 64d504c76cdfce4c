//! `sitekeep ping <site-id>` and `sitekeep backup <site-id>`

use sitekeep_core::{CoreError, MaintenanceLogEntry, SiteId, TaskKind, Trigger};

use crate::cli::{GlobalOpts, SiteArgs};
use crate::commands::worker::build_orchestrator;
use crate::error::CliError;
use crate::output::{self, Field};

pub async fn handle(args: &SiteArgs, kind: TaskKind, global: &GlobalOpts) -> Result<(), CliError> {
    let config = sitekeep_config::load_config(global.config.as_deref())?;
    let orchestrator = build_orchestrator(&config).await?;

    let site_id = SiteId::from(args.site_id.as_str());
    let entry = orchestrator
        .run_task(&site_id, kind, Trigger::Manual)
        .await
        .map_err(|e| match e {
            CoreError::SiteNotFound { id } => CliError::SiteNotFound { id },
            source => CliError::Task {
                kind: kind.to_string(),
                id: args.site_id.clone(),
                source,
            },
        })?;

    let out = output::render_single(global.output, &entry, detail)?;
    output::print_output(&out);
    Ok(())
}

fn detail(entry: &MaintenanceLogEntry) -> String {
    output::render_table(&[
        Field::new("Site", &entry.site_id),
        Field::new("Task", entry.kind),
        Field::new("Outcome", entry.outcome),
        Field::new("When (UTC)", entry.created_at.format("%Y-%m-%d %H:%M:%S")),
        Field::new("Detail", entry.summary()),
    ])
}
