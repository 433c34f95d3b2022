use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub capture: CaptureConfig,
    pub transcription: TranscriptionConfig,
    pub summarization: SummarizationConfig,
    pub note: NoteConfig,
    pub command: CommandConfig,
    pub api: ApiConfig,
}

/// Folders for the artifacts each session leaves behind. Relative paths are
/// resolved against the platform data directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub recordings_dir: String,
    pub transcripts_dir: String,
    pub notes_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub use_microphone: bool,
    pub capture_system_audio: bool,
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// "http" or "cli".
    pub backend: String,
    pub endpoint: Option<String>,
    pub auth_token: Option<String>,
    pub model: Option<String>,
    pub language: Option<String>,
    pub command: Option<String>,
    /// Argument template for the CLI backend. Placeholders: {{audioFile}},
    /// {{outputDir}}, {{baseName}}, {{transcriptFile}}, {{model}}.
    pub args: String,
    pub output_extension: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationConfig {
    /// "http", "cli", or empty to rely on the heuristic summarizer.
    pub backend: String,
    pub endpoint: Option<String>,
    pub auth_token: Option<String>,
    pub model: Option<String>,
    /// Prompt template; {{transcript}} is replaced with the transcript text.
    pub prompt: String,
    pub command: Option<String>,
    /// Argument template for the CLI backend. Placeholders:
    /// {{transcriptFile}}, {{outputDir}}, {{baseName}}, {{outputFile}}, {{model}}.
    pub args: String,
    pub output_extension: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteConfig {
    pub include_transcript: bool,
    pub embed_audio: bool,
    pub open_note_after_creation: bool,
    pub summary_heading: String,
    pub action_items_heading: String,
    pub transcript_heading: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Working directory for CLI backends. Empty means inherit.
    pub working_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub listen_addr: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            recordings_dir: "recordings".to_string(),
            transcripts_dir: "transcripts".to_string(),
            notes_dir: "notes".to_string(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            use_microphone: true,
            capture_system_audio: true,
            sample_rate: 16000,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            backend: "http".to_string(),
            endpoint: None,
            auth_token: None,
            model: None,
            language: Some("en".to_string()),
            command: None,
            args: "--model {{model}} --output_txt --output_dir {{outputDir}} {{audioFile}}"
                .to_string(),
            output_extension: "txt".to_string(),
            timeout_seconds: 120,
        }
    }
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            backend: String::new(),
            endpoint: None,
            auth_token: None,
            model: None,
            prompt: "Summarize the following meeting transcript. Reply with a short \
                     summary followed by a list of action items.\n\n{{transcript}}"
                .to_string(),
            command: None,
            args: "--prompt-file {{transcriptFile}} --output {{outputFile}}".to_string(),
            output_extension: "md".to_string(),
            timeout_seconds: 60,
        }
    }
}

impl Default for NoteConfig {
    fn default() -> Self {
        Self {
            include_transcript: true,
            embed_audio: true,
            open_note_after_creation: true,
            summary_heading: "## Summary".to_string(),
            action_items_heading: "## Action Items".to_string(),
            transcript_heading: "## Transcript".to_string(),
        }
    }
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            working_dir: String::new(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3746".to_string(),
        }
    }
}

impl StorageConfig {
    pub fn recordings_path(&self) -> Result<PathBuf> {
        resolve_dir(&self.recordings_dir)
    }

    pub fn transcripts_path(&self) -> Result<PathBuf> {
        resolve_dir(&self.transcripts_dir)
    }

    pub fn notes_path(&self) -> Result<PathBuf> {
        resolve_dir(&self.notes_dir)
    }
}

fn resolve_dir(dir: &str) -> Result<PathBuf> {
    let path = Path::new(dir);
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(global::data_dir()?.join(path))
    }
}

impl CommandConfig {
    pub fn working_dir(&self) -> Option<PathBuf> {
        let trimmed = self.working_dir.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = global::config_file()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&global::config_file()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, content).context("Failed to write config file")?;

        Ok(())
    }
}
