// SEO recommendation generation
//
// Pro-tier audits can be enriched with free-text advice from a chat
// completion model. The provider is optional and may fail without
// affecting the audit itself.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{Error, preview};
use crate::transport::TransportConfig;

pub const DEFAULT_RECOMMEND_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_RECOMMEND_MODEL: &str = "gpt-4o-mini";

const NO_SUGGESTIONS: &str = "No suggestions available.";

/// Produces human-readable SEO advice for an analysis summary.
#[async_trait]
pub trait Recommender: Send + Sync {
    async fn suggest(&self, analysis: &serde_json::Value) -> Result<String, Error>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Render the prompt sent to the model for one analysis.
pub fn recommendation_prompt(analysis: &serde_json::Value) -> String {
    let pretty = serde_json::to_string_pretty(analysis).unwrap_or_default();
    format!(
        "You are an SEO expert. Given the following website analysis, rewrite its\n\
         title and description to improve ranking and propose 3 keyword ideas.\n\n{pretty}\n"
    )
}

/// Recommender backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAiRecommender {
    http: reqwest::Client,
    api_url: Url,
    model: String,
    timeout_secs: u64,
}

impl OpenAiRecommender {
    pub fn new(
        api_url: Url,
        api_key: &SecretString,
        model: String,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| Error::Client(format!("invalid recommendation API key: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        Ok(Self {
            http: transport.build_client_with_headers(headers)?,
            api_url,
            model,
            timeout_secs: transport.timeout_secs(),
        })
    }
}

#[async_trait]
impl Recommender for OpenAiRecommender {
    async fn suggest(&self, analysis: &serde_json::Value) -> Result<String, Error> {
        let prompt = recommendation_prompt(analysis);
        debug!(model = %self.model, "POST {}", self.api_url);

        let resp = self
            .http
            .post(self.api_url.clone())
            .json(&ChatRequest {
                model: &self.model,
                messages: [ChatMessage {
                    role: "user",
                    content: &prompt,
                }],
            })
            .send()
            .await
            .map_err(|e| Error::from_request(e, self.timeout_secs))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::from_request(e, self.timeout_secs))?;
        if !status.is_success() {
            return Err(Error::Recommendation {
                message: format!("HTTP {status}: {}", preview(&body)),
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body: body.clone(),
            })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| NO_SUGGESTIONS.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_analysis() {
        let prompt = recommendation_prompt(&serde_json::json!({ "title": "Bakery" }));
        assert!(prompt.contains("SEO expert"));
        assert!(prompt.contains("\"title\": \"Bakery\""));
    }
}
