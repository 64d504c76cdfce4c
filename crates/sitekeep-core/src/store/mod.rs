// ── Persistence seams ──
//
// Sites are read (and their meta updated) through `SiteRepository`; task
// history goes through the append-only `MaintenanceLog`. Both are async
// traits so file- and service-backed stores plug in behind `Arc<dyn Store>`.

mod file;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::model::{MaintenanceLogEntry, Site, SiteId, SiteMetaPatch, SiteStatus, TaskKind};

pub use file::FileStore;
pub use memory::MemoryStore;

#[async_trait]
pub trait SiteRepository: Send + Sync {
    /// Every site in `status`, ordered by id.
    async fn find_sites_by_status(&self, status: SiteStatus) -> Result<Vec<Site>, StoreError>;

    async fn get_site(&self, id: &SiteId) -> Result<Option<Site>, StoreError>;

    /// Apply `patch` to the site's meta and return the updated site.
    async fn update_site_meta(&self, id: &SiteId, patch: SiteMetaPatch)
    -> Result<Site, StoreError>;
}

#[async_trait]
pub trait MaintenanceLog: Send + Sync {
    async fn append_log_entry(&self, entry: MaintenanceLogEntry) -> Result<(), StoreError>;

    /// Most recent entry for `(site, kind)` by creation time.
    async fn latest_log_entry(
        &self,
        site: &SiteId,
        kind: TaskKind,
    ) -> Result<Option<MaintenanceLogEntry>, StoreError>;

    /// Entries of every kind created at or after `since`, oldest first.
    async fn log_entries_since(
        &self,
        site: &SiteId,
        since: DateTime<Utc>,
    ) -> Result<Vec<MaintenanceLogEntry>, StoreError>;

    /// Up to `limit` entries, newest first.
    async fn recent_log_entries(
        &self,
        site: &SiteId,
        limit: usize,
    ) -> Result<Vec<MaintenanceLogEntry>, StoreError>;
}

/// Combined persistence handle used by the orchestrator.
pub trait Store: SiteRepository + MaintenanceLog {}

impl<T: SiteRepository + MaintenanceLog> Store for T {}
