//! Transcript summarization with pluggable backends and a guaranteed result.
//!
//! Unlike transcription, summarization never fails the pipeline: when no
//! backend is configured, or the backend errors, times out, or returns an
//! empty summary, the heuristic fallback takes over and the result records
//! why.

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{CommandConfig, SummarizationConfig};

mod cli;
mod http;
pub mod parser;

pub use cli::CliSummarizer;
pub use http::HttpSummarizer;
pub use parser::ParsedSummary;

#[derive(Debug, Clone)]
pub struct SummarizationResult {
    pub summary: String,
    pub action_items: Vec<String>,
    pub used_fallback: bool,
    /// Why the primary path was not used. Always present when
    /// `used_fallback` is true.
    pub error_message: Option<String>,
    pub raw_output: String,
}

/// Everything a backend may need to build its invocation.
#[derive(Debug, Clone)]
pub struct SummaryRequest<'a> {
    pub transcript: &'a str,
    pub transcript_path: Option<&'a Path>,
    pub base_name: &'a str,
}

/// What a backend hands back before fallback policy is applied.
#[derive(Debug, Clone)]
pub struct BackendSummary {
    pub parsed: ParsedSummary,
    pub raw_output: String,
}

#[async_trait]
pub trait SummarizationBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn summarize(&self, request: &SummaryRequest<'_>) -> Result<BackendSummary>;
}

pub struct Summarizer {
    backend: Option<Box<dyn SummarizationBackend>>,
}

impl Summarizer {
    pub fn new(backend: Option<Box<dyn SummarizationBackend>>) -> Self {
        Self { backend }
    }

    /// Build from configuration. An empty backend name selects the heuristic
    /// fallback; an unknown one is a configuration error.
    pub fn from_config(
        config: &SummarizationConfig,
        command: &CommandConfig,
        transcripts_dir: PathBuf,
    ) -> Result<Self> {
        let backend: Option<Box<dyn SummarizationBackend>> = match config.backend.trim() {
            "" => None,
            "http" => Some(Box::new(HttpSummarizer::new(config)?)),
            "cli" => Some(Box::new(CliSummarizer::new(config, command, transcripts_dir)?)),
            other => anyhow::bail!(
                "Unknown summarization backend '{}'. Supported backends: http, cli",
                other
            ),
        };

        if let Some(backend) = &backend {
            info!("Using {} for summarization", backend.name());
        } else {
            info!("No summarization backend configured, heuristic summarizer will be used");
        }

        Ok(Self { backend })
    }

    pub async fn summarize(&self, request: &SummaryRequest<'_>) -> SummarizationResult {
        let Some(backend) = &self.backend else {
            return fallback_summary(
                request.transcript,
                "Summarization backend is not configured.".to_string(),
                String::new(),
            );
        };

        match backend.summarize(request).await {
            Ok(output) if output.parsed.summary.trim().is_empty() => fallback_summary(
                request.transcript,
                format!("{} returned an empty summary.", backend.name()),
                output.raw_output,
            ),
            Ok(output) => SummarizationResult {
                summary: output.parsed.summary,
                action_items: output.parsed.action_items,
                used_fallback: false,
                error_message: None,
                raw_output: output.raw_output,
            },
            Err(e) => fallback_summary(
                request.transcript,
                format!("{} failed: {:#}", backend.name(), e),
                String::new(),
            ),
        }
    }
}

/// Heuristic extractive summary of the transcript itself.
pub fn fallback_summary(
    transcript: &str,
    reason: String,
    raw_output: String,
) -> SummarizationResult {
    warn!("Falling back to heuristic summarizer: {}", reason);

    let cleaned = transcript.trim();
    if cleaned.is_empty() {
        return SummarizationResult {
            summary: "No transcript was generated.".to_string(),
            action_items: Vec::new(),
            used_fallback: true,
            error_message: Some(reason),
            raw_output,
        };
    }

    SummarizationResult {
        summary: parser::heuristic_summary(cleaned),
        action_items: parser::heuristic_action_items(cleaned),
        used_fallback: true,
        error_message: Some(reason),
        raw_output,
    }
}
