// ── File-backed store ──
//
// Sites live in one JSON document owned by the provisioning side. It is
// re-read whenever its size or mtime changes, and meta updates patch the
// single record on disk. Log entries are appended to a JSON-lines journal
// and replayed into a `MemoryStore` on open.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::{MaintenanceLog, MemoryStore, SiteRepository};
use crate::error::StoreError;
use crate::model::{MaintenanceLogEntry, Site, SiteId, SiteMetaPatch, SiteStatus, TaskKind};

/// Identity of the sites document as last loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    modified: SystemTime,
    len: u64,
}

#[derive(Debug)]
pub struct FileStore {
    sites_path: PathBuf,
    journal_path: PathBuf,
    memory: MemoryStore,
    /// Held while the sites view is reloaded or the document rewritten.
    sites_lock: Mutex<Option<Fingerprint>>,
    /// Serializes journal appends so lines never interleave.
    journal_lock: Mutex<()>,
}

impl FileStore {
    /// Open the store, loading sites and replaying the journal. A missing
    /// sites file or journal reads as empty.
    pub async fn open(
        sites_path: impl Into<PathBuf>,
        journal_path: impl Into<PathBuf>,
    ) -> Result<Self, StoreError> {
        let sites_path = sites_path.into();
        let journal_path = journal_path.into();

        let fingerprint = fingerprint(&sites_path).await?;
        let memory = MemoryStore::with_sites(load_sites(&sites_path).await?);
        let replayed = replay_journal(&journal_path, &memory).await?;

        info!(
            sites = memory.site_count(),
            entries = replayed,
            path = %sites_path.display(),
            "store opened"
        );

        Ok(Self {
            sites_path,
            journal_path,
            memory,
            sites_lock: Mutex::new(fingerprint),
            journal_lock: Mutex::new(()),
        })
    }

    /// Reload the sites view if the document changed since the last load.
    async fn refresh_sites(&self) -> Result<(), StoreError> {
        let mut loaded = self.sites_lock.lock().await;
        let current = fingerprint(&self.sites_path).await?;
        if current == *loaded {
            return Ok(());
        }
        self.reload_sites(&mut loaded).await
    }

    async fn reload_sites(&self, loaded: &mut Option<Fingerprint>) -> Result<(), StoreError> {
        // Fingerprint first: a write racing the read shows up as a change
        // on the next refresh.
        let current = fingerprint(&self.sites_path).await?;
        self.memory.replace_sites(load_sites(&self.sites_path).await?);
        *loaded = current;
        debug!(
            sites = self.memory.site_count(),
            path = %self.sites_path.display(),
            "sites document reloaded"
        );
        Ok(())
    }

    /// Patch the meta of one record in the on-disk document. Other records,
    /// invalid ones included, are written back as read.
    async fn patch_site_meta(&self, id: &SiteId, patch: SiteMetaPatch) -> Result<Site, StoreError> {
        let mut loaded = self.sites_lock.lock().await;

        let mut records = load_records(&self.sites_path).await?;
        let record = records
            .iter_mut()
            .find(|r| r.get("id").and_then(Value::as_str) == Some(id.as_str()))
            .ok_or_else(|| StoreError::SiteNotFound(id.to_string()))?;

        let mut site: Site = serde_json::from_value(record.clone())?;
        patch.apply(&mut site.meta);
        if let Value::Object(fields) = record {
            fields.insert("meta".into(), serde_json::to_value(&site.meta)?);
        }

        let body = serde_json::to_vec_pretty(&records)?;
        if let Some(parent) = self.sites_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tmp = self.sites_path.with_extension("json.tmp");
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, &self.sites_path).await?;

        self.reload_sites(&mut loaded).await?;
        Ok(site)
    }
}

async fn fingerprint(path: &Path) -> Result<Option<Fingerprint>, StoreError> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(Some(Fingerprint {
            modified: meta.modified()?,
            len: meta.len(),
        })),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn read_document<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<Option<T>, StoreError> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no sites file");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| StoreError::Corrupt {
            source_name: path.display().to_string(),
            line: e.line(),
            message: e.to_string(),
        })
}

async fn load_sites(path: &Path) -> Result<Vec<Site>, StoreError> {
    Ok(read_document(path).await?.unwrap_or_default())
}

async fn load_records(path: &Path) -> Result<Vec<Value>, StoreError> {
    Ok(read_document(path).await?.unwrap_or_default())
}

async fn replay_journal(path: &Path, memory: &MemoryStore) -> Result<usize, StoreError> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut replayed = 0;
    for (index, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<MaintenanceLogEntry>(line) {
            Ok(entry) => {
                memory.push_entry(entry);
                replayed += 1;
            }
            // Torn trailing lines from an interrupted append land here too.
            Err(e) => warn!(
                path = %path.display(),
                line = index + 1,
                error = %e,
                "skipping unreadable journal line"
            ),
        }
    }
    Ok(replayed)
}

#[async_trait]
impl SiteRepository for FileStore {
    async fn find_sites_by_status(&self, status: SiteStatus) -> Result<Vec<Site>, StoreError> {
        self.refresh_sites().await?;
        self.memory.find_sites_by_status(status).await
    }

    async fn get_site(&self, id: &SiteId) -> Result<Option<Site>, StoreError> {
        self.refresh_sites().await?;
        self.memory.get_site(id).await
    }

    async fn update_site_meta(
        &self,
        id: &SiteId,
        patch: SiteMetaPatch,
    ) -> Result<Site, StoreError> {
        self.patch_site_meta(id, patch)
            .await
            .inspect_err(|e| error!(site_id = %id, error = %e, "failed to persist site meta"))
    }
}

#[async_trait]
impl MaintenanceLog for FileStore {
    async fn append_log_entry(&self, entry: MaintenanceLogEntry) -> Result<(), StoreError> {
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');

        {
            let _guard = self.journal_lock.lock().await;
            if let Some(parent) = self.journal_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.journal_path)
                .await
                .inspect_err(|e| error!(error = %e, "failed to open journal"))?;
            file.write_all(&line).await?;
            file.flush().await?;
        }

        self.memory.push_entry(entry);
        Ok(())
    }

    async fn latest_log_entry(
        &self,
        site: &SiteId,
        kind: TaskKind,
    ) -> Result<Option<MaintenanceLogEntry>, StoreError> {
        self.memory.latest_log_entry(site, kind).await
    }

    async fn log_entries_since(
        &self,
        site: &SiteId,
        since: DateTime<Utc>,
    ) -> Result<Vec<MaintenanceLogEntry>, StoreError> {
        self.memory.log_entries_since(site, since).await
    }

    async fn recent_log_entries(
        &self,
        site: &SiteId,
        limit: usize,
    ) -> Result<Vec<MaintenanceLogEntry>, StoreError> {
        self.memory.recent_log_entries(site, limit).await
    }
}
