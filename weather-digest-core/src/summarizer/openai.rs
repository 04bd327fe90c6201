use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    config::{DEFAULT_MODEL, OPENAI_BASE_URL, SummarySettings},
    error::SummarizeError,
    http::{endpoint, truncate_body},
    model::ForecastRecord,
};

use super::{Summarizer, build_prompt};

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 300;

/// Chat-completions client for OpenAI and compatible services.
#[derive(Debug, Clone)]
pub struct OpenAiSummarizer {
    api_key: SecretString,
    model: String,
    base_url: String,
    location_label: String,
    http: Client,
}

impl OpenAiSummarizer {
    pub fn new(settings: SummarySettings) -> Self {
        Self {
            api_key: settings.api_key,
            model: settings.model,
            base_url: settings.base_url,
            location_label: settings.location_label,
            http: Client::new(),
        }
    }

    pub fn with_api_key(api_key: SecretString, location_label: impl Into<String>) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            location_label: location_label.into(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String, SummarizeError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
            n: 1,
        };

        let res = self
            .http
            .post(endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(SummarizeError::request)?;

        let status = res.status();
        let body = res.text().await.map_err(SummarizeError::request)?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SummarizeError::Unauthorized(status));
        }
        if !status.is_success() {
            return Err(SummarizeError::Status { status, body: truncate_body(&body) });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(SummarizeError::EmptyCompletion)?;

        info!(chars = text.len(), "Summary complete");
        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, forecast: &[ForecastRecord]) -> Result<String, SummarizeError> {
        info!(records = forecast.len(), "Summarizing forecast");
        let prompt = build_prompt(&self.location_label, forecast);
        self.complete(&prompt).await
    }
}
