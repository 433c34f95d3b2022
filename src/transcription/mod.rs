//! Speech-to-text backends.
//!
//! Transcription is the one pipeline stage with no fallback: a failure here
//! is fatal to the session (the persisted audio artifact survives).

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{CommandConfig, TranscriptionConfig};

mod cli;
mod http;

pub use cli::CliTranscriber;
pub use http::HttpTranscriber;

/// Immutable once produced.
#[derive(Debug, Clone)]
pub struct TranscriptionResult {
    pub text: String,
    /// Set when the backend itself wrote the transcript to disk.
    pub transcript_path: Option<PathBuf>,
    pub raw_output: String,
}

#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptionResult>;
}

/// Build the configured backend. Missing endpoint/command or an unknown
/// backend name fail here, before any audio is captured.
pub fn build_backend(
    config: &TranscriptionConfig,
    command_config: &CommandConfig,
    transcripts_dir: PathBuf,
) -> Result<Box<dyn TranscriptionBackend>> {
    let backend: Box<dyn TranscriptionBackend> = match config.backend.trim() {
        "http" => Box::new(HttpTranscriber::new(config)?),
        "cli" => Box::new(CliTranscriber::new(config, command_config, transcripts_dir)?),
        other => bail!(
            "Unknown transcription backend '{}'. Supported backends: http, cli",
            other
        ),
    };

    info!("Using {} for transcription", backend.name());
    Ok(backend)
}
