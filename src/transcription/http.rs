//! HTTP transcription backend: multipart upload to a speech-to-text service.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TranscriptionConfig;

use super::{TranscriptionBackend, TranscriptionResult};

/// JSON fields checked, in order, for the transcript text.
const TEXT_CANDIDATES: [&str; 4] = ["text", "transcript", "transcription", "result"];

pub struct HttpTranscriber {
    client: reqwest::Client,
    endpoint: String,
    auth_token: Option<String>,
    model: Option<String>,
    language: Option<String>,
}

impl HttpTranscriber {
    pub fn new(config: &TranscriptionConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .context("Transcription endpoint is not configured")?
            .to_string();

        let mut builder = reqwest::Client::builder();
        if config.timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_seconds));
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        info!("Initialized HTTP transcriber with endpoint: {}", endpoint);

        Ok(Self {
            client,
            endpoint,
            auth_token: config.auth_token.clone(),
            model: config.model.clone(),
            language: config.language.clone(),
        })
    }
}

#[async_trait]
impl TranscriptionBackend for HttpTranscriber {
    fn name(&self) -> &'static str {
        "HTTP transcriber"
    }

    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptionResult> {
        info!("Transcribing audio file via HTTP: {:?}", audio_path);

        let audio_data = tokio::fs::read(audio_path)
            .await
            .with_context(|| format!("Failed to read audio file {:?}", audio_path))?;

        let file_name = audio_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "meeting.wav".to_string());

        let file_part = reqwest::multipart::Part::bytes(audio_data)
            .file_name(file_name)
            .mime_str("audio/wav")
            .context("Failed to build multipart file part")?;

        let mut form = reqwest::multipart::Form::new().part("file", file_part);
        if let Some(model) = &self.model {
            form = form.text("model", model.clone());
        }
        if let Some(language) = &self.language {
            form = form.text("language", language.clone());
        }

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(token) = &self.auth_token {
            request = request.header("Authorization", token);
        }

        let response = request
            .send()
            .await
            .context("Failed to send request to transcription service")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read transcription response body")?;

        if !status.is_success() {
            bail!(
                "Transcription service responded with {}: {}",
                status,
                response_text.trim()
            );
        }

        let payload: Value = serde_json::from_str(&response_text)
            .context("Failed to parse transcription response as JSON")?;

        let text = extract_text(&payload);
        if text.is_empty() {
            bail!("Transcription service did not return a transcript");
        }

        debug!("Transcription complete: {} chars", text.len());

        Ok(TranscriptionResult {
            text,
            transcript_path: None,
            raw_output: response_text,
        })
    }
}

fn extract_text(payload: &Value) -> String {
    if let Value::String(s) = payload {
        return s.trim().to_string();
    }

    if let Value::Object(map) = payload {
        for key in TEXT_CANDIDATES {
            if let Some(text) = map.get(key).and_then(Value::as_str) {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }

        // Whisper-style segment lists are joined as a last resort.
        if let Some(Value::Array(segments)) = map.get("segments") {
            let joined = segments
                .iter()
                .filter_map(|segment| segment.get("text").and_then(Value::as_str))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            return joined.trim().to_string();
        }
    }

    String::new()
}
