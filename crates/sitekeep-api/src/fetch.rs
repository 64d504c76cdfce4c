// Deployed-site fetching
//
// GET requests against tenant deployments: timed liveness probes and
// document downloads for SEO audits and backups. Redirects are followed
// according to the shared transport policy.

use std::time::{Duration, Instant};

use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Outcome of a liveness probe that reached the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResponse {
    /// Final HTTP status after redirects.
    pub status: u16,
    /// Wall-clock time from request start until headers arrived.
    pub duration: Duration,
}

impl ProbeResponse {
    /// A probe counts as healthy when the final status is below 400.
    pub fn is_healthy(&self) -> bool {
        self.status < 400
    }
}

/// HTTP client for deployed tenant sites.
#[derive(Debug, Clone)]
pub struct SiteFetcher {
    http: reqwest::Client,
    timeout_secs: u64,
}

impl SiteFetcher {
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            timeout_secs: transport.timeout_secs(),
        })
    }

    /// Create a fetcher around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, timeout_secs: u64) -> Self {
        Self { http, timeout_secs }
    }

    /// Issue a GET and time it.
    ///
    /// Any HTTP status is returned as a [`ProbeResponse`]; only network
    /// level failures (DNS, refused, timeout) produce an error.
    pub async fn probe(&self, url: &str) -> Result<ProbeResponse, Error> {
        let url = Url::parse(url)?;
        debug!("PROBE {}", url);

        let started = Instant::now();
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::from_request(e, self.timeout_secs))?;
        let duration = started.elapsed();

        Ok(ProbeResponse {
            status: resp.status().as_u16(),
            duration,
        })
    }

    /// Download the document served at `url` as text.
    pub async fn fetch_html(&self, url: &str) -> Result<String, Error> {
        let url = Url::parse(url)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::from_request(e, self.timeout_secs))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        resp.text()
            .await
            .map_err(|e| Error::from_request(e, self.timeout_secs))
    }
}
