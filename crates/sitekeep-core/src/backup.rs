// ── Backup Producer ──
//
// Downloads a deployment's rendered top-level document, packages it as a
// single-entry ZIP and hands it to object storage. Linked assets are not
// followed.

use std::io::{Cursor, Write};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use sitekeep_api::{ObjectStore, SiteFetcher};
use tracing::{debug, info};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::error::BackupError;
use crate::model::{BackupRecord, SiteId};

const ARCHIVE_ENTRY: &str = "index.html";
const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

pub struct BackupProducer {
    fetcher: SiteFetcher,
    storage: Arc<dyn ObjectStore>,
}

impl BackupProducer {
    pub fn new(fetcher: SiteFetcher, storage: Arc<dyn ObjectStore>) -> Self {
        Self { fetcher, storage }
    }

    /// Back up the deployment at `deploy_url` for `site_id`.
    pub async fn backup(
        &self,
        site_id: &SiteId,
        deploy_url: &str,
    ) -> Result<BackupRecord, BackupError> {
        if deploy_url.trim().is_empty() {
            return Err(BackupError::MissingDeployUrl);
        }

        let html = self
            .fetcher
            .fetch_html(deploy_url)
            .await
            .map_err(BackupError::Fetch)?;
        let archive = package(&html)?;

        let timestamp = timestamp_key(Utc::now());
        let key = format!("backups/{site_id}/{timestamp}.zip");
        let size_bytes = u64::try_from(archive.len()).unwrap_or(u64::MAX);
        debug!(%site_id, key, size_bytes, "uploading backup");

        self.storage
            .put(&key, Bytes::from(archive), ARCHIVE_CONTENT_TYPE)
            .await
            .map_err(BackupError::Storage)?;

        let locator = self.storage.locator(&key);
        info!(%site_id, locator, "backup stored");

        Ok(BackupRecord {
            key,
            locator,
            timestamp,
            size_bytes,
        })
    }
}

/// RFC 3339 with milliseconds, made safe for object keys.
pub fn timestamp_key(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

fn package(html: &str) -> Result<Vec<u8>, BackupError> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    writer
        .start_file(ARCHIVE_ENTRY, options)
        .map_err(|e| BackupError::Archive(e.to_string()))?;
    writer
        .write_all(html.as_bytes())
        .map_err(|e| BackupError::Archive(e.to_string()))?;
    let cursor = writer
        .finish()
        .map_err(|e| BackupError::Archive(e.to_string()))?;
    Ok(cursor.into_inner())
}
