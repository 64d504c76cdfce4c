// Shared transport configuration for building reqwest::Client instances.
//
// The site fetcher, object store, mailer and recommendation client all
// share timeout, redirect, and user-agent settings through this module,
// avoiding duplicated builder logic.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;

use crate::error::Error;

const DEFAULT_USER_AGENT: &str = concat!("sitekeep/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Upper bound for every request, connect through body.
    pub timeout: Duration,
    /// Maximum redirects followed before a request fails.
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            max_redirects: 10,
            user_agent: DEFAULT_USER_AGENT.into(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        self.build_client_with_headers(HeaderMap::new())
    }

    /// Build a `reqwest::Client` with additional default headers.
    ///
    /// Used by the mail and recommendation clients to inject their
    /// `Authorization` header once.
    pub fn build_client_with_headers(&self, headers: HeaderMap) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .redirect(Policy::limited(self.max_redirects))
            .user_agent(self.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Client(e.to_string()))
    }

    /// Timeout in whole seconds, for error reporting.
    pub fn timeout_secs(&self) -> u64 {
        self.timeout.as_secs()
    }
}
