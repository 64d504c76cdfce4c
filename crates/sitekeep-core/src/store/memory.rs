// ── In-memory store ──
//
// DashMap-backed sites and per-site journals. Writes are visible to the
// next read. Journals stay sorted by `created_at`; ties keep insertion order.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::warn;

use super::{MaintenanceLog, SiteRepository};
use crate::error::StoreError;
use crate::model::{MaintenanceLogEntry, Site, SiteId, SiteMetaPatch, SiteStatus, TaskKind};

#[derive(Debug, Default)]
pub struct MemoryStore {
    sites: DashMap<SiteId, Site>,
    journals: DashMap<SiteId, Vec<MaintenanceLogEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from site records, skipping invalid ones.
    pub fn with_sites(sites: impl IntoIterator<Item = Site>) -> Self {
        let store = Self::new();
        for site in sites {
            if let Err(e) = store.insert_site(site) {
                warn!(error = %e, "skipping invalid site record");
            }
        }
        store
    }

    /// Insert or replace a site. Records violating the deployment
    /// invariant are rejected.
    pub fn insert_site(&self, site: Site) -> Result<(), StoreError> {
        site.validate()
            .map_err(|reason| StoreError::Corrupt {
                source_name: "site".into(),
                line: 0,
                message: format!("{}: {reason}", site.id),
            })?;
        self.sites.insert(site.id.clone(), site);
        Ok(())
    }

    /// Swap the site view for a freshly loaded document. Invalid records
    /// are skipped; ids absent from `sites` are dropped.
    pub(crate) fn replace_sites(&self, sites: impl IntoIterator<Item = Site>) {
        let mut seen = HashSet::new();
        for site in sites {
            let id = site.id.clone();
            match self.insert_site(site) {
                Ok(()) => {
                    seen.insert(id);
                }
                Err(e) => warn!(error = %e, "skipping invalid site record"),
            }
        }
        self.sites.retain(|id, _| seen.contains(id));
    }

    /// Insert an entry at its chronological position.
    pub(crate) fn push_entry(&self, entry: MaintenanceLogEntry) {
        let mut journal = self.journals.entry(entry.site_id.clone()).or_default();
        let at = journal.partition_point(|e| e.created_at <= entry.created_at);
        journal.insert(at, entry);
    }

    fn all_sites(&self) -> Vec<Site> {
        let mut sites: Vec<Site> = self.sites.iter().map(|r| r.value().clone()).collect();
        sites.sort_by(|a, b| a.id.cmp(&b.id));
        sites
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    pub fn entry_count(&self) -> usize {
        self.journals.iter().map(|r| r.value().len()).sum()
    }
}

#[async_trait]
impl SiteRepository for MemoryStore {
    async fn find_sites_by_status(&self, status: SiteStatus) -> Result<Vec<Site>, StoreError> {
        Ok(self
            .all_sites()
            .into_iter()
            .filter(|s| s.status == status)
            .collect())
    }

    async fn get_site(&self, id: &SiteId) -> Result<Option<Site>, StoreError> {
        Ok(self.sites.get(id).map(|r| r.value().clone()))
    }

    async fn update_site_meta(
        &self,
        id: &SiteId,
        patch: SiteMetaPatch,
    ) -> Result<Site, StoreError> {
        let mut site = self
            .sites
            .get_mut(id)
            .ok_or_else(|| StoreError::SiteNotFound(id.to_string()))?;
        patch.apply(&mut site.meta);
        Ok(site.clone())
    }
}

#[async_trait]
impl MaintenanceLog for MemoryStore {
    async fn append_log_entry(&self, entry: MaintenanceLogEntry) -> Result<(), StoreError> {
        self.push_entry(entry);
        Ok(())
    }

    async fn latest_log_entry(
        &self,
        site: &SiteId,
        kind: TaskKind,
    ) -> Result<Option<MaintenanceLogEntry>, StoreError> {
        Ok(self.journals.get(site).and_then(|journal| {
            journal.iter().rev().find(|e| e.kind == kind).cloned()
        }))
    }

    async fn log_entries_since(
        &self,
        site: &SiteId,
        since: DateTime<Utc>,
    ) -> Result<Vec<MaintenanceLogEntry>, StoreError> {
        Ok(self
            .journals
            .get(site)
            .map(|journal| {
                let start = journal.partition_point(|e| e.created_at < since);
                journal[start..].to_vec()
            })
            .unwrap_or_default())
    }

    async fn recent_log_entries(
        &self,
        site: &SiteId,
        limit: usize,
    ) -> Result<Vec<MaintenanceLogEntry>, StoreError> {
        Ok(self
            .journals
            .get(site)
            .map(|journal| journal.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::model::{Plan, SiteMeta};

    fn site(id: &str, status: SiteStatus, url: Option<&str>) -> Site {
        Site {
            id: id.into(),
            name: id.to_uppercase(),
            tenant_id: "t1".into(),
            contact_email: None,
            status,
            deploy_url: url.map(str::to_owned),
            plan: Plan::Pro,
            billing_status: crate::model::BillingStatus::Active,
            meta: SiteMeta::default(),
        }
    }

    fn entry(kind: TaskKind, minutes_ago: i64) -> MaintenanceLogEntry {
        MaintenanceLogEntry::failure("s1".into(), kind, crate::model::Trigger::Cron, "x")
            .with_created_at(Utc::now() - Duration::minutes(minutes_ago))
    }

    #[tokio::test]
    async fn invalid_sites_are_skipped() {
        let store = MemoryStore::with_sites([
            site("b", SiteStatus::Deployed, Some("https://b.example.com")),
            site("a", SiteStatus::Deployed, None),
            site("c", SiteStatus::Uploaded, None),
        ]);
        assert_eq!(store.site_count(), 2);
        let deployed = store.find_sites_by_status(SiteStatus::Deployed).await.unwrap();
        assert_eq!(deployed.len(), 1);
        assert_eq!(deployed[0].id.as_str(), "b");
    }

    #[tokio::test]
    async fn latest_entry_is_chronological_not_insertion_order() {
        let store = MemoryStore::new();
        store.append_log_entry(entry(TaskKind::Backup, 5)).await.unwrap();
        store.append_log_entry(entry(TaskKind::Backup, 60)).await.unwrap();
        store.append_log_entry(entry(TaskKind::Uptime, 1)).await.unwrap();

        let latest = store
            .latest_log_entry(&"s1".into(), TaskKind::Backup)
            .await
            .unwrap()
            .unwrap();
        assert!(Utc::now() - latest.created_at < Duration::minutes(10));
        assert!(store.latest_log_entry(&"s1".into(), TaskKind::Seo).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn windows_and_recent_listing() {
        let store = MemoryStore::new();
        for minutes in [300, 120, 30, 10] {
            store.append_log_entry(entry(TaskKind::Uptime, minutes)).await.unwrap();
        }
        let id: SiteId = "s1".into();

        let since = store
            .log_entries_since(&id, Utc::now() - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(since.len(), 2);
        assert!(since[0].created_at < since[1].created_at);

        let recent = store.recent_log_entries(&id, 3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert!(recent[0].created_at > recent[1].created_at);
        assert_eq!(store.entry_count(), 4);
    }

    #[tokio::test]
    async fn meta_updates_are_read_back() {
        let store =
            MemoryStore::with_sites([site("s1", SiteStatus::Deployed, Some("https://x.example"))]);
        let patch = SiteMetaPatch {
            seo_score: Some(88),
            ..SiteMetaPatch::default()
        };
        store.update_site_meta(&"s1".into(), patch).await.unwrap();
        let site = store.get_site(&"s1".into()).await.unwrap().unwrap();
        assert_eq!(site.meta.seo_score, 88);

        let missing = store
            .update_site_meta(&"nope".into(), SiteMetaPatch::default())
            .await;
        assert!(matches!(missing, Err(StoreError::SiteNotFound(_))));
    }

    #[tokio::test]
    async fn replacing_sites_drops_missing_and_invalid_ids() {
        let store = MemoryStore::with_sites([
            site("a", SiteStatus::Deployed, Some("https://a.example.com")),
            site("b", SiteStatus::Deployed, Some("https://b.example.com")),
        ]);
        let mut a = site("a", SiteStatus::Deployed, Some("https://a.example.com"));
        a.billing_status = crate::model::BillingStatus::Canceled;
        store.replace_sites([
            a,
            site("c", SiteStatus::Deployed, None),
            site("d", SiteStatus::Uploaded, None),
        ]);

        assert_eq!(store.site_count(), 2);
        let a = store.get_site(&"a".into()).await.unwrap().unwrap();
        assert_eq!(a.billing_status, crate::model::BillingStatus::Canceled);
        assert!(store.get_site(&"b".into()).await.unwrap().is_none());
        assert!(store.get_site(&"c".into()).await.unwrap().is_none());
    }
}
