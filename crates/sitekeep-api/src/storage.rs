// Object storage for backup archives
//
// The provider wire protocol is deliberately thin: an authenticated HTTP
// PUT of the object body, or a plain write into a local directory. The
// public locator is always derived from the key and a configured base URL.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::error::{Error, preview};
use crate::transport::TransportConfig;

/// A write-only object store addressed by string keys.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Persist `body` under `key`, replacing any existing object.
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), Error>;

    /// The stable public locator for `key`.
    fn locator(&self, key: &str) -> String;
}

fn join_locator(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}

// ── HTTP ────────────────────────────────────────────────────────────

/// S3-style object store reached by `PUT {endpoint}/{bucket}/{key}`.
pub struct HttpObjectStore {
    http: reqwest::Client,
    endpoint: Url,
    bucket: String,
    public_base_url: String,
    token: Option<SecretString>,
    timeout_secs: u64,
}

impl HttpObjectStore {
    pub fn new(
        endpoint: Url,
        bucket: String,
        public_base_url: Option<String>,
        token: Option<SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let public_base_url = public_base_url
            .unwrap_or_else(|| join_locator(endpoint.as_str(), &bucket));
        Ok(Self {
            http: transport.build_client()?,
            endpoint,
            bucket,
            public_base_url,
            token,
            timeout_secs: transport.timeout_secs(),
        })
    }

    fn object_url(&self, key: &str) -> Result<Url, Error> {
        let base = self.endpoint.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{}/{key}", self.bucket))?)
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), Error> {
        let url = self.object_url(key)?;
        debug!(key, size = body.len(), "PUT {}", url);

        let mut builder = self
            .http
            .put(url)
            .header(CONTENT_TYPE, content_type)
            .body(body);
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token.expose_secret());
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| Error::from_request(e, self.timeout_secs))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Storage {
                key: key.to_owned(),
                message: format!("HTTP {status}: {}", preview(&body)),
            });
        }
        Ok(())
    }

    fn locator(&self, key: &str) -> String {
        join_locator(&self.public_base_url, key)
    }
}

// ── Filesystem ──────────────────────────────────────────────────────

/// Object store rooted at a local directory. Useful for single-host
/// deployments and tests.
pub struct FsObjectStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: Option<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, Error> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(Error::Storage {
                key: key.to_owned(),
                message: "key must be a relative path without '..'".into(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, key: &str, body: Bytes, _content_type: &str) -> Result<(), Error> {
        let path = self.object_path(key)?;
        let storage_err = |e: std::io::Error| Error::Storage {
            key: key.to_owned(),
            message: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(storage_err)?;
        }
        debug!(key, path = %path.display(), size = body.len(), "writing object");
        tokio::fs::write(&path, &body).await.map_err(storage_err)
    }

    fn locator(&self, key: &str) -> String {
        match self.public_base_url {
            Some(ref base) => join_locator(base, key),
            None => self.root.join(key).display().to_string(),
        }
    }
}
