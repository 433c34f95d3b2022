//! CLI summarization backend: a local executable fed the prompt on stdin.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use crate::command::{run_command, split_command_line, RunOptions};
use crate::config::{CommandConfig, SummarizationConfig};
use crate::template;

use super::{parser, BackendSummary, SummarizationBackend, SummaryRequest};

pub struct CliSummarizer {
    command: String,
    args_template: String,
    prompt_template: String,
    output_extension: String,
    model: Option<String>,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
    transcripts_dir: PathBuf,
}

impl CliSummarizer {
    pub fn new(
        config: &SummarizationConfig,
        command_config: &CommandConfig,
        transcripts_dir: PathBuf,
    ) -> Result<Self> {
        let command = config
            .command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .context("Summarization command is not configured")?
            .to_string();

        which::which(&command)
            .with_context(|| format!("Summarization command `{}` was not found", command))?;

        info!("Initialized CLI summarizer with command: {}", command);

        Ok(Self {
            command,
            args_template: config.args.clone(),
            prompt_template: config.prompt.clone(),
            output_extension: config
                .output_extension
                .trim_start_matches('.')
                .to_string(),
            model: config.model.clone(),
            working_dir: command_config.working_dir(),
            timeout: (config.timeout_seconds > 0)
                .then(|| Duration::from_secs(config.timeout_seconds)),
            transcripts_dir,
        })
    }
}

#[async_trait]
impl SummarizationBackend for CliSummarizer {
    fn name(&self) -> &'static str {
        "CLI summarizer"
    }

    async fn summarize(&self, request: &SummaryRequest<'_>) -> Result<BackendSummary> {
        let extension = if self.output_extension.is_empty() {
            "md"
        } else {
            self.output_extension.as_str()
        };
        let output_file = self
            .transcripts_dir
            .join(format!("{}-summary.{}", request.base_name, extension));

        let transcript_file = request
            .transcript_path
            .map(|path| path.display().to_string())
            .unwrap_or_default();

        let replacements = template::values([
            ("transcriptFile", transcript_file),
            ("outputDir", self.transcripts_dir.display().to_string()),
            ("baseName", request.base_name.to_string()),
            ("outputFile", output_file.display().to_string()),
            ("model", self.model.clone().unwrap_or_default()),
        ]);

        let args_string = template::expand(&self.args_template, &replacements);
        let args = split_command_line(&args_string);

        let mut prompt = if self.prompt_template.trim().is_empty() {
            request.transcript.to_string()
        } else {
            template::expand(
                &self.prompt_template,
                &template::values([("transcript", request.transcript.to_string())]),
            )
        };
        if !prompt.ends_with('\n') {
            prompt.push('\n');
        }

        tokio::fs::create_dir_all(&self.transcripts_dir)
            .await
            .with_context(|| {
                format!("Failed to create directory {:?}", self.transcripts_dir)
            })?;

        debug!("Running summarization command: {} {:?}", self.command, args);

        let output = run_command(
            &self.command,
            &args,
            RunOptions {
                cwd: self.working_dir.clone(),
                input: Some(prompt),
                timeout: self.timeout,
                ..Default::default()
            },
        )
        .await
        .with_context(|| format!("Summarization command `{}` failed", self.command))?;

        // Prefer the file the command was asked to write; fall back to stdout
        // and persist it where downstream consumers expect it.
        let raw = match tokio::fs::read_to_string(&output_file).await {
            Ok(content) => content,
            Err(_) => {
                let stdout = output.stdout.trim().to_string();
                if stdout.is_empty() {
                    bail!(
                        "Summarization command produced neither the output file {:?} nor stdout",
                        output_file
                    );
                }
                tokio::fs::write(&output_file, &stdout)
                    .await
                    .with_context(|| format!("Failed to persist summary to {:?}", output_file))?;
                stdout
            }
        };

        Ok(BackendSummary {
            parsed: parser::parse_output(&raw),
            raw_output: output.stdout,
        })
    }
}
