// Weekly report delivery
//
// Reports are plain HTML e-mails posted to a transactional mail API
// (Resend-compatible `POST /emails`).

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::{Error, preview};
use crate::transport::TransportConfig;

pub const DEFAULT_MAIL_API_URL: &str = "https://api.resend.com/emails";

/// Delivers a rendered report to one recipient.
#[async_trait]
pub trait ReportMailer: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, html: &str) -> Result<(), Error>;
}

#[derive(Serialize)]
struct SendEmail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Mailer for the Resend e-mail API.
pub struct ResendMailer {
    http: reqwest::Client,
    api_url: Url,
    from: String,
    timeout_secs: u64,
}

impl ResendMailer {
    pub fn new(
        api_url: Url,
        api_key: &SecretString,
        from: String,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| Error::Client(format!("invalid mail API key: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        Ok(Self {
            http: transport.build_client_with_headers(headers)?,
            api_url,
            from,
            timeout_secs: transport.timeout_secs(),
        })
    }
}

#[async_trait]
impl ReportMailer for ResendMailer {
    async fn send(&self, recipient: &str, subject: &str, html: &str) -> Result<(), Error> {
        debug!(recipient, subject, "POST {}", self.api_url);

        let resp = self
            .http
            .post(self.api_url.clone())
            .json(&SendEmail {
                from: &self.from,
                to: [recipient],
                subject,
                html,
            })
            .send()
            .await
            .map_err(|e| Error::from_request(e, self.timeout_secs))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Mail {
                status: status.as_u16(),
                body: preview(&body),
            });
        }
        Ok(())
    }
}
