//! Parsing of summarizer output of unknown shape.
//!
//! Backends return whatever their model produced: a JSON document, a
//! heading-delimited Markdown body, or free text. Everything funnels through
//! `parse_output`, which normalizes to a summary plus an ordered,
//! deduplicated action-item list. The same heuristics double as the fallback
//! summarizer when no backend is available.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSummary {
    pub summary: String,
    pub action_items: Vec<String>,
}

const SUMMARY_KEYS: [&str; 6] = ["summary", "synopsis", "response", "text", "result", "notes"];
const ACTION_KEYS: [&str; 4] = ["actionItems", "action_items", "tasks", "todos"];
const ACTION_KEYWORDS: [&str; 8] = [
    "action",
    "todo",
    "to-do",
    "follow up",
    "follow-up",
    "next step",
    "task",
    "deliverable",
];

/// How many non-empty lines stand in for a summary when Markdown output has
/// no summary heading.
const SUMMARY_FALLBACK_LINES: usize = 8;
/// How many sentences of the transcript the heuristic summary keeps.
const SUMMARY_FALLBACK_SENTENCES: usize = 3;

fn summary_heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^#+\s*summary").expect("valid regex"))
}

fn action_heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(^#+\s*(action|next steps?))|(^action items?:)").expect("valid regex")
    })
}

fn bullet_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[-*+]\s*|\d+[.)]\s+)?(?:\[[ xX]?\]\s*)?").expect("valid regex")
    })
}

/// Parse raw backend output into a summary and action items.
pub fn parse_output(output: &str) -> ParsedSummary {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return ParsedSummary::default();
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        match &value {
            Value::String(_) | Value::Object(_) => return parse_json_value(&value),
            // Bare numbers/booleans parse as JSON but are not summarizer
            // output shapes; fall through to the text scan.
            _ => {}
        }
    }

    parse_markdown(trimmed)
}

/// Parse an already-decoded JSON payload (shared with the HTTP backend).
pub fn parse_json_value(value: &Value) -> ParsedSummary {
    match value {
        Value::String(s) => ParsedSummary {
            summary: s.trim().to_string(),
            action_items: Vec::new(),
        },
        Value::Object(map) => {
            let summary = SUMMARY_KEYS
                .iter()
                .filter_map(|key| map.get(*key))
                .filter_map(Value::as_str)
                .map(str::trim)
                .find(|s| !s.is_empty())
                .unwrap_or_default()
                .to_string();

            let action_items = ACTION_KEYS
                .iter()
                .filter_map(|key| map.get(*key))
                .find_map(json_action_items)
                .unwrap_or_default();

            ParsedSummary {
                summary,
                action_items: dedup(action_items),
            }
        }
        _ => ParsedSummary::default(),
    }
}

fn json_action_items(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(entries) => Some(
            entries
                .iter()
                .map(|entry| match entry {
                    Value::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        Value::String(s) => Some(s.lines().map(|line| line.trim().to_string()).collect()),
        _ => None,
    }
}

fn parse_markdown(text: &str) -> ParsedSummary {
    let mut summary_lines: Vec<&str> = Vec::new();
    let mut action_items: Vec<String> = Vec::new();
    let mut in_summary = false;
    let mut in_actions = false;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if summary_heading_regex().is_match(line) {
            in_summary = true;
            in_actions = false;
            continue;
        }
        if action_heading_regex().is_match(line) {
            in_summary = false;
            in_actions = true;
            continue;
        }
        if in_actions {
            if !line.is_empty() {
                action_items.push(clean_bullet(line));
            }
            continue;
        }
        if in_summary {
            summary_lines.push(line);
        }
    }

    let summary = if summary_lines.iter().any(|line| !line.is_empty()) {
        summary_lines.join("\n").trim().to_string()
    } else {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(SUMMARY_FALLBACK_LINES)
            .collect::<Vec<_>>()
            .join("\n")
    };

    if action_items.is_empty() {
        // Markdown output with no action heading: bullets count as items too.
        action_items = collect_action_lines(text, true);
    }

    ParsedSummary {
        summary,
        action_items: dedup(action_items),
    }
}

/// First sentences of the transcript, used when no backend produced a summary.
pub fn heuristic_summary(transcript: &str) -> String {
    let normalized = transcript.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return String::new();
    }

    let sentences = split_sentences(&normalized);
    if sentences.is_empty() {
        return normalized.chars().take(240).collect();
    }

    sentences
        .into_iter()
        .take(SUMMARY_FALLBACK_SENTENCES)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Transcript lines that look actionable: checklist entries, or lines
/// mentioning one of the action keywords.
pub fn heuristic_action_items(text: &str) -> Vec<String> {
    dedup(collect_action_lines(text, false))
}

fn collect_action_lines(text: &str, allow_plain_bullets: bool) -> Vec<String> {
    let mut items = Vec::new();

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with("- [") || (allow_plain_bullets && line.starts_with("- ")) {
            items.push(clean_bullet(line));
            continue;
        }

        let lowered = line.to_lowercase();
        if ACTION_KEYWORDS
            .iter()
            .any(|keyword| lowered.contains(keyword))
        {
            items.push(clean_bullet(line));
        }
    }

    items
}

fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?')
            && chars.peek().map(|next| next.is_whitespace()).unwrap_or(false)
        {
            let sentence = current.trim().to_string();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            current.clear();
        }
    }

    let tail = current.trim().to_string();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}

fn clean_bullet(line: &str) -> String {
    bullet_regex().replace(line.trim(), "").trim().to_string()
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| !item.is_empty() && seen.insert(item.clone()))
        .collect()
}
