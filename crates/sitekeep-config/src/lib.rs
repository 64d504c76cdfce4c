//! Configuration for the sitekeep worker.
//!
//! Layered loading (built-in defaults, TOML file, `SITEKEEP_` environment),
//! validation, and translation into the runtime types consumed by
//! `sitekeep-core` and `sitekeep-api`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use sitekeep_api::{
    DEFAULT_MAIL_API_URL, DEFAULT_RECOMMEND_API_URL, DEFAULT_RECOMMEND_MODEL, FsObjectStore,
    HttpObjectStore, ObjectStore, OpenAiRecommender, Recommender, ReportMailer, ResendMailer,
    TransportConfig,
};
use sitekeep_core::MaintenanceConfig;

const ENV_PREFIX: &str = "SITEKEEP_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("failed to set up {component}: {source}")]
    Client {
        component: &'static str,
        #[source]
        source: sitekeep_api::Error,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level worker configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schedule: Schedule,
    #[serde(default)]
    pub http: Http,
    #[serde(default)]
    pub store: Store,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub report: Report,
    #[serde(default)]
    pub recommend: Recommend,
}

/// Cron cadences (6-field, seconds first, UTC) and task intervals.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Schedule {
    pub uptime_cron: String,
    pub backup_cron: String,
    pub seo_cron: String,
    /// Minimum time between backups, e.g. `"7d"`.
    pub backup_interval: String,
    pub seo_interval: String,
    pub report_window: String,
    pub max_concurrent_sites: usize,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            uptime_cron: "0 0 0 * * *".into(),
            backup_cron: "0 0 2 * * SUN".into(),
            seo_cron: "0 0 3 * * SUN".into(),
            backup_interval: "7d".into(),
            seo_interval: "7d".into(),
            report_window: "7d".into(),
            max_concurrent_sites: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Http {
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for Http {
    fn default() -> Self {
        Self {
            timeout_secs: 20,
            user_agent: None,
        }
    }
}

/// Where sites and the maintenance journal live. Unset paths resolve
/// under the platform data directory.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Store {
    pub sites_path: Option<PathBuf>,
    pub journal_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Fs,
    Http,
}

/// Backup object storage.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Storage {
    pub backend: StorageBackend,
    /// Root directory for the `fs` backend.
    pub directory: Option<PathBuf>,
    /// Base URL for the `http` backend.
    pub endpoint: Option<String>,
    pub bucket: Option<String>,
    pub public_base_url: Option<String>,
    /// Bearer token (plaintext; prefer `SITEKEEP_STORAGE__TOKEN`).
    pub token: Option<String>,
}

/// Weekly report delivery. Reports are disabled without an API key.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Report {
    pub api_key: Option<String>,
    pub from: Option<String>,
    pub api_url: String,
}

impl Default for Report {
    fn default() -> Self {
        Self {
            api_key: None,
            from: None,
            api_url: DEFAULT_MAIL_API_URL.into(),
        }
    }
}

/// External SEO recommendations. Disabled without an API key.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Recommend {
    pub api_key: Option<String>,
    pub model: String,
    pub api_url: String,
}

impl Default for Recommend {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_RECOMMEND_MODEL.into(),
            api_url: DEFAULT_RECOMMEND_API_URL.into(),
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "sitekeep", "sitekeep")
}

/// Default config file location via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from(".sitekeep").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default directory for sites, the journal, and local backups.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from(".sitekeep"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

// ── Loading ─────────────────────────────────────────────────────────

/// Layered sources: defaults, then `path`, then `SITEKEEP_*` variables
/// (`__` separates sections, e.g. `SITEKEEP_STORAGE__BUCKET`).
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load and validate the configuration.
///
/// An explicit `path` must exist; the default location is optional.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) if !p.exists() => {
            return Err(ConfigError::MissingFile {
                path: p.to_path_buf(),
            });
        }
        Some(p) => p.to_path_buf(),
        None => config_path(),
    };
    debug!(path = %path.display(), "loading config");

    let config: Config = figment(&path).extract()?;
    config.validate()?;
    Ok(config)
}

fn parse_interval(field: &str, raw: &str) -> Result<Duration, ConfigError> {
    let d = humantime::parse_duration(raw.trim())
        .map_err(|e| invalid(field, format!("'{raw}': {e}")))?;
    if d.is_zero() {
        return Err(invalid(field, "must be greater than zero"));
    }
    Ok(d)
}

fn check_cron(field: &str, expr: &str) -> Result<(), ConfigError> {
    let fields = expr.split_whitespace().count();
    if (6..=7).contains(&fields) {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("'{expr}' has {fields} fields, expected 6 (seconds first)"),
        ))
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| invalid(field, format!("'{raw}': {e}")))
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

// ── Validation and runtime wiring ───────────────────────────────────

impl Config {
    /// Reject settings that cannot produce a working worker.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.schedule;
        check_cron("schedule.uptime_cron", &s.uptime_cron)?;
        check_cron("schedule.backup_cron", &s.backup_cron)?;
        check_cron("schedule.seo_cron", &s.seo_cron)?;
        self.maintenance_config()?;

        if self.http.timeout_secs == 0 {
            return Err(invalid("http.timeout_secs", "must be greater than zero"));
        }

        if self.storage.backend == StorageBackend::Http {
            let endpoint = non_empty(self.storage.endpoint.as_ref())
                .ok_or_else(|| invalid("storage.endpoint", "required for the http backend"))?;
            parse_url("storage.endpoint", endpoint)?;
            if non_empty(self.storage.bucket.as_ref()).is_none() {
                return Err(invalid("storage.bucket", "required for the http backend"));
            }
        }

        if non_empty(self.report.api_key.as_ref()).is_some() {
            if non_empty(self.report.from.as_ref()).is_none() {
                return Err(invalid("report.from", "required when report.api_key is set"));
            }
            parse_url("report.api_url", &self.report.api_url)?;
        }
        if non_empty(self.recommend.api_key.as_ref()).is_some() {
            parse_url("recommend.api_url", &self.recommend.api_url)?;
        }
        Ok(())
    }

    pub fn maintenance_config(&self) -> Result<MaintenanceConfig, ConfigError> {
        let s = &self.schedule;
        if s.max_concurrent_sites == 0 {
            return Err(invalid("schedule.max_concurrent_sites", "must be at least 1"));
        }
        Ok(MaintenanceConfig {
            backup_interval: parse_interval("schedule.backup_interval", &s.backup_interval)?,
            seo_interval: parse_interval("schedule.seo_interval", &s.seo_interval)?,
            report_window: parse_interval("schedule.report_window", &s.report_window)?,
            max_concurrent_sites: s.max_concurrent_sites,
        })
    }

    pub fn transport_config(&self) -> TransportConfig {
        let mut transport = TransportConfig {
            timeout: Duration::from_secs(self.http.timeout_secs),
            ..TransportConfig::default()
        };
        if let Some(agent) = non_empty(self.http.user_agent.as_ref()) {
            agent.clone_into(&mut transport.user_agent);
        }
        transport
    }

    /// Sites document and journal paths.
    pub fn store_paths(&self) -> (PathBuf, PathBuf) {
        let data = data_dir();
        let sites = self
            .store
            .sites_path
            .clone()
            .unwrap_or_else(|| data.join("sites.json"));
        let journal = self
            .store
            .journal_path
            .clone()
            .unwrap_or_else(|| data.join("maintenance.jsonl"));
        (sites, journal)
    }

    pub fn object_store(
        &self,
        transport: &TransportConfig,
    ) -> Result<Arc<dyn ObjectStore>, ConfigError> {
        let storage = &self.storage;
        let public_base_url = non_empty(storage.public_base_url.as_ref()).map(str::to_owned);
        match storage.backend {
            StorageBackend::Fs => {
                let root = storage
                    .directory
                    .clone()
                    .unwrap_or_else(|| data_dir().join("backups"));
                Ok(Arc::new(FsObjectStore::new(root, public_base_url)))
            }
            StorageBackend::Http => {
                let endpoint = non_empty(storage.endpoint.as_ref())
                    .ok_or_else(|| invalid("storage.endpoint", "required for the http backend"))?;
                let bucket = non_empty(storage.bucket.as_ref())
                    .ok_or_else(|| invalid("storage.bucket", "required for the http backend"))?;
                let token = non_empty(storage.token.as_ref()).map(|t| SecretString::from(t.to_owned()));
                let store = HttpObjectStore::new(
                    parse_url("storage.endpoint", endpoint)?,
                    bucket.to_owned(),
                    public_base_url,
                    token,
                    transport,
                )
                .map_err(|source| ConfigError::Client {
                    component: "object storage",
                    source,
                })?;
                Ok(Arc::new(store))
            }
        }
    }

    /// Report mailer, or `None` when no mail API key is configured.
    pub fn mailer(
        &self,
        transport: &TransportConfig,
    ) -> Result<Option<Arc<dyn ReportMailer>>, ConfigError> {
        let Some(key) = non_empty(self.report.api_key.as_ref()) else {
            return Ok(None);
        };
        let from = non_empty(self.report.from.as_ref())
            .ok_or_else(|| invalid("report.from", "required when report.api_key is set"))?;
        let mailer = ResendMailer::new(
            parse_url("report.api_url", &self.report.api_url)?,
            &SecretString::from(key.to_owned()),
            from.to_owned(),
            transport,
        )
        .map_err(|source| ConfigError::Client {
            component: "report mailer",
            source,
        })?;
        Ok(Some(Arc::new(mailer)))
    }

    /// Recommendation client, or `None` when no API key is configured.
    pub fn recommender(
        &self,
        transport: &TransportConfig,
    ) -> Result<Option<Arc<dyn Recommender>>, ConfigError> {
        let Some(key) = non_empty(self.recommend.api_key.as_ref()) else {
            return Ok(None);
        };
        let recommender = OpenAiRecommender::new(
            parse_url("recommend.api_url", &self.recommend.api_url)?,
            &SecretString::from(key.to_owned()),
            self.recommend.model.clone(),
            transport,
        )
        .map_err(|source| ConfigError::Client {
            component: "recommendation client",
            source,
        })?;
        Ok(Some(Arc::new(recommender)))
    }
}
