//! Session summaries from the assistant's JSONL transcripts.
//!
//! A summary is the first real prompt the user typed in a session, keyed by
//! the session's working directory.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Deserialize;
use wtui_core::paths::{home_dir, normalize_path_for_compare};

/// Only transcripts written to within this window are scanned.
pub const TRANSCRIPT_FRESHNESS: Duration = Duration::from_secs(300);

/// Longer summaries are cut and end in `…`.
pub const SUMMARY_MAX_CHARS: usize = 50;

/// Prefixes of user-role content that the assistant injects itself.
const SYNTHETIC_PREFIXES: &[&str] = &[
    "<command-",
    "<local-command-",
    "<system-reminder>",
    "Caveat:",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranscriptEntry {
    #[serde(default)]
    cwd: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    is_meta: bool,
    #[serde(default)]
    message: Option<TranscriptMessage>,
}

#[derive(Debug, Deserialize)]
struct TranscriptMessage {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: serde_json::Value,
}

/// `~/.claude/projects`
pub fn default_projects_dir() -> Option<PathBuf> {
    home_dir().map(|h| h.join(".claude").join("projects"))
}

/// Map cwd → summary over all fresh transcripts under `projects_dir`.
///
/// Files are visited newest first and the first summary found for a cwd wins.
pub fn summarize_transcripts(projects_dir: &Path, now: SystemTime) -> HashMap<String, String> {
    let mut summaries = HashMap::new();
    for path in fresh_transcripts(projects_dir, now) {
        let Some((cwd, summary)) = scan_transcript(&path) else {
            continue;
        };
        summaries
            .entry(normalize_path_for_compare(&cwd).to_string())
            .or_insert(summary);
    }
    summaries
}

/// `*.jsonl` files one level below each project directory, newest first.
fn fresh_transcripts(projects_dir: &Path, now: SystemTime) -> Vec<PathBuf> {
    let Ok(projects) = std::fs::read_dir(projects_dir) else {
        return Vec::new();
    };
    let mut files: Vec<(SystemTime, PathBuf)> = projects
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .filter_map(|e| std::fs::read_dir(e.path()).ok())
        .flatten()
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "jsonl"))
        .filter_map(|p| {
            let mtime = std::fs::metadata(&p).and_then(|m| m.modified()).ok()?;
            let age = now.duration_since(mtime).unwrap_or(Duration::ZERO);
            (age <= TRANSCRIPT_FRESHNESS).then_some((mtime, p))
        })
        .collect();
    files.sort_by(|a, b| b.0.cmp(&a.0));
    files.into_iter().map(|(_, p)| p).collect()
}

/// First cwd and first real user prompt in one transcript. Stops reading as
/// soon as both are known.
fn scan_transcript(path: &Path) -> Option<(String, String)> {
    let file = File::open(path)
        .map_err(|e| tracing::debug!(path = %path.display(), "open failed: {e}"))
        .ok()?;
    let mut cwd: Option<String> = None;
    let mut summary: Option<String> = None;

    for line in BufReader::new(file).lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        let Ok(entry) = serde_json::from_str::<TranscriptEntry>(&line) else {
            continue;
        };
        if cwd.is_none() {
            cwd = entry.cwd.clone().filter(|c| !c.is_empty());
        }
        if summary.is_none() {
            summary = user_prompt(&entry).map(|text| truncate_summary(&text));
        }
        if let (Some(cwd), Some(summary)) = (&cwd, &summary) {
            return Some((cwd.clone(), summary.clone()));
        }
    }
    None
}

fn user_prompt(entry: &TranscriptEntry) -> Option<String> {
    if entry.is_meta {
        return None;
    }
    let message = entry.message.as_ref()?;
    let is_user = entry.kind.as_deref() == Some("user") || message.role.as_deref() == Some("user");
    if !is_user {
        return None;
    }
    let text = match &message.content {
        serde_json::Value::String(s) => Some(s.as_str()),
        serde_json::Value::Array(blocks) => blocks.iter().find_map(|b| {
            (b.get("type").and_then(|t| t.as_str()) == Some("text"))
                .then(|| b.get("text").and_then(|t| t.as_str()))
                .flatten()
                .filter(|t| is_real_prompt(t))
        }),
        _ => None,
    }?;
    is_real_prompt(text).then(|| text.to_string())
}

fn is_real_prompt(text: &str) -> bool {
    let t = text.trim();
    !t.is_empty() && !SYNTHETIC_PREFIXES.iter().any(|p| t.starts_with(p))
}

/// Collapse whitespace onto one line and cap at [`SUMMARY_MAX_CHARS`].
fn truncate_summary(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= SUMMARY_MAX_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(SUMMARY_MAX_CHARS - 1).collect();
    cut.push('…');
    cut
}
