//! CLI transcription backend, e.g. a local whisper.cpp build.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::command::{run_command, split_command_line, RunOptions};
use crate::config::{CommandConfig, TranscriptionConfig};
use crate::template;

use super::{TranscriptionBackend, TranscriptionResult};

pub struct CliTranscriber {
    command: String,
    args_template: String,
    output_extension: String,
    model: Option<String>,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
    transcripts_dir: PathBuf,
}

impl CliTranscriber {
    pub fn new(
        config: &TranscriptionConfig,
        command_config: &CommandConfig,
        transcripts_dir: PathBuf,
    ) -> Result<Self> {
        let command = config
            .command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .context("Transcription command is not configured")?
            .to_string();

        which::which(&command)
            .with_context(|| format!("Transcription command `{}` was not found", command))?;

        info!("Initialized CLI transcriber with command: {}", command);

        let output_extension = {
            let cleaned = config.output_extension.trim_start_matches('.');
            if cleaned.is_empty() { "txt" } else { cleaned }.to_string()
        };

        Ok(Self {
            command,
            args_template: config.args.clone(),
            output_extension,
            model: config.model.clone(),
            working_dir: command_config.working_dir(),
            timeout: (config.timeout_seconds > 0)
                .then(|| Duration::from_secs(config.timeout_seconds)),
            transcripts_dir,
        })
    }

    /// Where the command is expected to leave the transcript: the audio
    /// file's name with the configured output extension, in the transcripts
    /// directory.
    fn expected_output(&self, base_name: &str) -> PathBuf {
        self.transcripts_dir
            .join(format!("{}.{}", base_name, self.output_extension))
    }
}

#[async_trait]
impl TranscriptionBackend for CliTranscriber {
    fn name(&self) -> &'static str {
        "CLI transcriber"
    }

    async fn transcribe(&self, audio_path: &Path) -> Result<TranscriptionResult> {
        info!("Transcribing audio file via CLI: {:?}", audio_path);

        let base_name = audio_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .context("Audio path has no file name")?;

        tokio::fs::create_dir_all(&self.transcripts_dir)
            .await
            .with_context(|| {
                format!("Failed to create directory {:?}", self.transcripts_dir)
            })?;

        let expected = self.expected_output(&base_name);
        let replacements = template::values([
            ("audioFile", audio_path.display().to_string()),
            ("outputDir", self.transcripts_dir.display().to_string()),
            ("baseName", base_name.clone()),
            ("transcriptFile", expected.display().to_string()),
            ("model", self.model.clone().unwrap_or_default()),
        ]);

        let args_string = template::expand(&self.args_template, &replacements);
        let args = split_command_line(&args_string);

        debug!("Running transcription command: {} {:?}", self.command, args);

        let output = run_command(
            &self.command,
            &args,
            RunOptions {
                cwd: self.working_dir.clone(),
                timeout: self.timeout,
                ..Default::default()
            },
        )
        .await
        .with_context(|| format!("Transcription command `{}` failed", self.command))?;

        let text = match tokio::fs::read_to_string(&expected).await {
            Ok(content) => content.trim().to_string(),
            Err(_) => {
                // Some tools print the transcript instead of writing a file;
                // accept stdout and persist it where later stages expect it.
                let stdout = output.stdout.trim().to_string();
                if stdout.is_empty() {
                    bail!(
                        "Transcription command completed but no output file was found at {:?}",
                        expected
                    );
                }
                tokio::fs::write(&expected, &stdout)
                    .await
                    .with_context(|| {
                        format!("Failed to persist transcript to {:?}", expected)
                    })?;
                stdout
            }
        };

        if text.is_empty() {
            bail!("Transcription command did not return a transcript");
        }

        debug!("Transcription complete: {} chars", text.len());

        Ok(TranscriptionResult {
            text,
            transcript_path: Some(expected),
            raw_output: output.stdout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(command: &str, args: &str) -> TranscriptionConfig {
        TranscriptionConfig {
            backend: "cli".to_string(),
            command: Some(command.to_string()),
            args: args.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_stdout_is_accepted_and_persisted() {
        let tmp = tempfile::tempdir().unwrap();
        let audio = tmp.path().join("meeting.wav");
        tokio::fs::write(&audio, b"RIFF").await.unwrap();

        let transcriber = CliTranscriber::new(
            &config_with("echo", "transcribed {{baseName}}"),
            &CommandConfig::default(),
            tmp.path().join("transcripts"),
        )
        .unwrap();

        let result = transcriber.transcribe(&audio).await.unwrap();
        assert_eq!(result.text, "transcribed meeting");

        let expected = tmp.path().join("transcripts/meeting.txt");
        assert_eq!(result.transcript_path.as_deref(), Some(expected.as_path()));
        assert_eq!(
            tokio::fs::read_to_string(&expected).await.unwrap(),
            "transcribed meeting"
        );
    }

    #[tokio::test]
    async fn test_existing_output_file_wins_over_stdout() {
        let tmp = tempfile::tempdir().unwrap();
        let audio = tmp.path().join("meeting.wav");
        tokio::fs::write(&audio, b"RIFF").await.unwrap();
        let transcripts = tmp.path().join("transcripts");
        tokio::fs::create_dir_all(&transcripts).await.unwrap();
        tokio::fs::write(transcripts.join("meeting.txt"), "from file")
            .await
            .unwrap();

        let transcriber = CliTranscriber::new(
            &config_with("echo", "from stdout"),
            &CommandConfig::default(),
            transcripts,
        )
        .unwrap();

        let result = transcriber.transcribe(&audio).await.unwrap();
        assert_eq!(result.text, "from file");
    }

    #[tokio::test]
    async fn test_no_output_at_all_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let audio = tmp.path().join("meeting.wav");
        tokio::fs::write(&audio, b"RIFF").await.unwrap();

        let transcriber = CliTranscriber::new(
            &config_with("true", ""),
            &CommandConfig::default(),
            tmp.path().join("transcripts"),
        )
        .unwrap();

        let err = transcriber.transcribe(&audio).await.unwrap_err();
        assert!(err.to_string().contains("no output file"));
    }

    #[tokio::test]
    async fn test_whitespace_only_stdout_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let audio = tmp.path().join("meeting.wav");
        tokio::fs::write(&audio, b"RIFF").await.unwrap();

        let transcriber = CliTranscriber::new(
            &config_with("echo", "' '"),
            &CommandConfig::default(),
            tmp.path().join("transcripts"),
        )
        .unwrap();

        assert!(transcriber.transcribe(&audio).await.is_err());
    }
}
