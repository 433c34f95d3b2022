//! HTTP summarization backend: JSON POST to a local LLM endpoint.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::SummarizationConfig;
use crate::template;

use super::{parser, BackendSummary, SummarizationBackend, SummaryRequest};

pub struct HttpSummarizer {
    client: reqwest::Client,
    endpoint: String,
    auth_token: Option<String>,
    model: Option<String>,
    prompt_template: String,
}

impl HttpSummarizer {
    pub fn new(config: &SummarizationConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .context("Summarization endpoint is not configured")?
            .to_string();

        let mut builder = reqwest::Client::builder();
        if config.timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_seconds));
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        info!("Initialized HTTP summarizer with endpoint: {}", endpoint);

        Ok(Self {
            client,
            endpoint,
            auth_token: config.auth_token.clone(),
            model: config.model.clone(),
            prompt_template: config.prompt.clone(),
        })
    }

    fn build_prompt(&self, transcript: &str) -> String {
        if self.prompt_template.trim().is_empty() {
            return transcript.to_string();
        }
        template::expand(
            &self.prompt_template,
            &template::values([("transcript", transcript.to_string())]),
        )
    }
}

#[async_trait]
impl SummarizationBackend for HttpSummarizer {
    fn name(&self) -> &'static str {
        "HTTP summarizer"
    }

    async fn summarize(&self, request: &SummaryRequest<'_>) -> Result<BackendSummary> {
        let body = json!({
            "model": self.model,
            "prompt": self.build_prompt(request.transcript),
            "stream": false,
        });

        debug!("Sending summarization request to {}", self.endpoint);

        let mut http_request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.auth_token {
            http_request = http_request.header("Authorization", token);
        }

        let response = http_request
            .send()
            .await
            .context("Failed to send request to summarization service")?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let response_text = response
            .text()
            .await
            .context("Failed to read summarization response body")?;

        if !status.is_success() {
            bail!(
                "Summarization service responded with {}: {}",
                status,
                response_text.trim()
            );
        }

        if !content_type.contains("application/json") {
            bail!(
                "Summarization service returned a non-JSON response (content-type: {})",
                if content_type.is_empty() {
                    "missing"
                } else {
                    content_type.as_str()
                }
            );
        }

        let payload: serde_json::Value = serde_json::from_str(&response_text)
            .context("Failed to parse summarization response as JSON")?;

        let parsed = parser::parse_json_value(&payload);
        debug!(
            "Summarization response parsed: {} chars summary, {} action items",
            parsed.summary.len(),
            parsed.action_items.len()
        );

        Ok(BackendSummary {
            parsed,
            raw_output: response_text,
        })
    }
}
