//! Meeting note composition.
//!
//! Pure functions from pipeline results to a Markdown body. Every section is
//! always rendered; missing data shows up as an explicit placeholder, never
//! as a silently dropped heading.

pub mod store;

pub use store::NoteStore;

use crate::audio::SourceFlags;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct NoteContext {
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub sources: SourceFlags,
    pub audio_path: Option<PathBuf>,
    pub transcript_path: Option<PathBuf>,
    pub summary: String,
    pub action_items: Vec<String>,
    pub summary_used_fallback: bool,
    pub summary_error: Option<String>,
    pub transcript: String,
}

#[derive(Debug, Clone)]
pub struct NotePolicy {
    pub include_transcript: bool,
    pub embed_audio: bool,
    pub summary_heading: String,
    pub action_items_heading: String,
    pub transcript_heading: String,
}

impl Default for NotePolicy {
    fn default() -> Self {
        Self {
            include_transcript: true,
            embed_audio: true,
            summary_heading: "## Summary".to_string(),
            action_items_heading: "## Action Items".to_string(),
            transcript_heading: "## Transcript".to_string(),
        }
    }
}

/// A configured heading that trims to nothing falls back to the default so
/// the section never loses its marker.
fn heading_or<'a>(configured: &'a str, default: &'a str) -> &'a str {
    let trimmed = configured.trim();
    if trimmed.is_empty() {
        default
    } else {
        trimmed
    }
}

pub fn default_title(created_at: DateTime<Utc>) -> String {
    format!("Meeting - {}", created_at.format("%Y-%m-%d %H:%M"))
}

/// Render the full note body.
pub fn build_note_content(context: &NoteContext, policy: &NotePolicy) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("---".to_string());
    lines.push(format!("created: {}", context.created_at.to_rfc3339()));
    lines.push(format!("duration: {}", format_duration(context.duration_ms)));
    lines.push(format!("sources: {}", describe_sources(&context.sources)));
    lines.push("---".to_string());
    lines.push(String::new());

    lines.push(format!("# {}", context.title));
    lines.push(String::new());

    match &context.audio_path {
        Some(path) if policy.embed_audio => {
            lines.push(format!("![audio]({})", path.display()));
        }
        Some(path) => {
            lines.push(format!("[Audio recording]({})", path.display()));
        }
        None => {
            lines.push("Audio: not saved.".to_string());
        }
    }
    if let Some(path) = &context.transcript_path {
        lines.push(format!("Transcript file: [transcript]({})", path.display()));
    }
    lines.push(String::new());

    lines.push(heading_or(&policy.summary_heading, "## Summary").to_string());
    lines.push(String::new());
    if context.summary_used_fallback {
        let reason = context
            .summary_error
            .as_deref()
            .unwrap_or("primary summarizer unavailable");
        lines.push(format!("> Generated with fallback summarizer: {}", reason));
        lines.push(String::new());
    }
    if context.summary.trim().is_empty() {
        lines.push("_(No summary available.)_".to_string());
    } else {
        lines.push(context.summary.trim().to_string());
    }
    lines.push(String::new());

    lines.push(heading_or(&policy.action_items_heading, "## Action Items").to_string());
    lines.push(String::new());
    if context.action_items.is_empty() {
        lines.push("- [ ] No action items captured.".to_string());
    } else {
        for item in &context.action_items {
            lines.push(format!("- [ ] {}", item));
        }
    }

    if policy.include_transcript {
        lines.push(String::new());
        lines.push(heading_or(&policy.transcript_heading, "## Transcript").to_string());
        lines.push(String::new());
        lines.push("```".to_string());
        if context.transcript.trim().is_empty() {
            lines.push("(no transcript)".to_string());
        } else {
            lines.push(context.transcript.trim().to_string());
        }
        lines.push("```".to_string());
    }

    lines.push(String::new());
    lines.join("\n")
}

/// Render a duration as `Hh Mm Ss`, omitting zero-valued leading units.
/// An all-zero duration renders as `0s`.
pub fn format_duration(duration_ms: i64) -> String {
    let total_seconds = (duration_ms.max(0) + 500) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

pub fn describe_sources(sources: &SourceFlags) -> String {
    match (sources.microphone, sources.system) {
        (true, true) => "microphone + system audio".to_string(),
        (true, false) => "microphone".to_string(),
        (false, true) => "system audio".to_string(),
        (false, false) => "unknown".to_string(),
    }
}
