use thiserror::Error;

/// Top-level error type for the `sitekeep-api` crate.
///
/// Covers every outbound failure mode: fetching deployed sites, writing
/// backup objects, delivering reports, and requesting recommendations.
/// `sitekeep-core` maps these into task-level outcomes.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The remote answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Building the underlying HTTP client failed.
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    // ── Object storage ──────────────────────────────────────────────
    /// The object store rejected or failed a write.
    #[error("Object storage write failed for '{key}': {message}")]
    Storage { key: String, message: String },

    // ── Report delivery ─────────────────────────────────────────────
    /// The mail provider rejected the report.
    #[error("Failed to send report email: HTTP {status} {body}")]
    Mail { status: u16, body: String },

    // ── Recommendations ─────────────────────────────────────────────
    /// The recommendation provider returned an unusable response.
    #[error("Recommendation request failed: {message}")]
    Recommendation { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Status { status, .. } | Self::Mail { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Translate a reqwest failure, surfacing timeouts as [`Error::Timeout`].
    pub(crate) fn from_request(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_secs }
        } else {
            Self::Transport(err)
        }
    }
}

/// First 200 characters of a response body, for log-friendly messages.
pub(crate) fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_carry_the_code() {
        let err = Error::Status {
            status: 503,
            url: "https://example.com".into(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "HTTP 503 from https://example.com");
    }

    #[test]
    fn mail_errors_carry_the_code() {
        let err = Error::Mail {
            status: 422,
            body: "bad recipient".into(),
        };
        assert_eq!(err.status(), Some(422));
    }

    #[test]
    fn timeouts_have_no_status() {
        assert_eq!(Error::Timeout { timeout_secs: 20 }.status(), None);
    }
}
