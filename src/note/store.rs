//! Filesystem store for the artifacts a session produces: the audio blob,
//! the transcript, and the final note.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct NoteStore {
    recordings_dir: PathBuf,
    transcripts_dir: PathBuf,
    notes_dir: PathBuf,
}

impl NoteStore {
    pub fn new(recordings_dir: PathBuf, transcripts_dir: PathBuf, notes_dir: PathBuf) -> Self {
        Self {
            recordings_dir,
            transcripts_dir,
            notes_dir,
        }
    }

    pub fn recordings_dir(&self) -> &Path {
        &self.recordings_dir
    }

    pub fn transcripts_dir(&self) -> &Path {
        &self.transcripts_dir
    }

    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    pub async fn write_audio(
        &self,
        base_name: &str,
        extension: &str,
        bytes: &[u8],
    ) -> Result<PathBuf> {
        let path = self
            .prepare_target(&self.recordings_dir, base_name, extension)
            .await?;
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write audio file {:?}", path))?;
        info!("Audio saved: {:?} ({} bytes)", path, bytes.len());
        Ok(path)
    }

    pub async fn write_transcript(
        &self,
        base_name: &str,
        extension: &str,
        text: &str,
    ) -> Result<PathBuf> {
        let path = self
            .prepare_target(&self.transcripts_dir, base_name, extension)
            .await?;
        tokio::fs::write(&path, text)
            .await
            .with_context(|| format!("Failed to write transcript file {:?}", path))?;
        info!("Transcript saved: {:?} ({} chars)", path, text.len());
        Ok(path)
    }

    pub async fn write_note(&self, title: &str, content: &str) -> Result<PathBuf> {
        let path = self.prepare_target(&self.notes_dir, title, "md").await?;
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write note file {:?}", path))?;
        info!("Note saved: {:?}", path);
        Ok(path)
    }

    /// The path a CLI transcription backend is expected to write to.
    pub fn expected_transcript_path(&self, base_name: &str, extension: &str) -> PathBuf {
        self.transcripts_dir
            .join(format!("{}.{}", base_name, trim_extension(extension)))
    }

    async fn prepare_target(
        &self,
        dir: &Path,
        base_name: &str,
        extension: &str,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory {:?}", dir))?;
        Ok(available_path(dir, base_name, trim_extension(extension)))
    }
}

fn trim_extension(extension: &str) -> &str {
    extension.trim_start_matches('.')
}

/// First collision-free `<base_name> <n>.<ext>` path inside `dir`.
fn available_path(dir: &Path, base_name: &str, extension: &str) -> PathBuf {
    let candidate = dir.join(format!("{}.{}", base_name, extension));
    if !candidate.exists() {
        return candidate;
    }

    let mut counter = 1;
    loop {
        let candidate = dir.join(format!("{} {}.{}", base_name, counter, extension));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
