//! `sitekeep history <site-id>`

use sitekeep_core::{FileStore, MaintenanceLog, MaintenanceLogEntry, SiteId, SiteRepository};
use tabled::Tabled;

use crate::cli::{GlobalOpts, HistoryArgs};
use crate::error::CliError;
use crate::output;

const MAX_LIMIT: usize = 100;

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "When (UTC)")]
    when: String,
    #[tabled(rename = "Task")]
    kind: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Trigger")]
    trigger: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

fn to_row(e: &MaintenanceLogEntry) -> EntryRow {
    EntryRow {
        when: e.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        kind: e.kind.to_string(),
        outcome: e.outcome.to_string(),
        trigger: e.trigger.to_string(),
        detail: e.summary(),
    }
}

pub async fn handle(args: &HistoryArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = sitekeep_config::load_config(global.config.as_deref())?;
    let (sites_path, journal_path) = config.store_paths();
    let store = FileStore::open(sites_path, journal_path).await?;

    let site_id = SiteId::from(args.site_id.as_str());
    if store.get_site(&site_id).await?.is_none() {
        return Err(CliError::SiteNotFound {
            id: args.site_id.clone(),
        });
    }

    let limit = args.limit.clamp(1, MAX_LIMIT);
    let entries = store.recent_log_entries(&site_id, limit).await?;
    let out = output::render_list(global.output, &entries, to_row)?;
    output::print_output(&out);
    Ok(())
}
