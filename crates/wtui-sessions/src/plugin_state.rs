//! Plugin-written session state files (`<state dir>/*.json`).
//!
//! The companion plugin rewrites one file per assistant session on every
//! lifecycle hook. Files are never locked; a torn or half-written file simply
//! fails to parse and is skipped until the next poll.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use wtui_core::PluginState;
use wtui_core::paths::home_dir;

/// States older than this are treated as nonexistent.
pub const STALE_AFTER: Duration = Duration::from_secs(120);

/// `~/.claude/wtui/sessions`
pub fn default_state_dir() -> Option<PathBuf> {
    home_dir().map(|h| h.join(".claude").join("wtui").join("sessions"))
}

/// Read every fresh state file in `dir`, newest first.
pub fn load_plugin_states(dir: &Path, now: DateTime<Utc>) -> Vec<PluginState> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::trace!(dir = %dir.display(), "no plugin state dir: {e}");
            return Vec::new();
        }
    };
    let window = chrono::Duration::seconds(STALE_AFTER.as_secs() as i64);

    let mut states: Vec<PluginState> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|p| read_state(&p))
        .filter(|st| st.is_fresh(now, window))
        .collect();
    states.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    states
}

fn read_state(path: &Path) -> Option<PluginState> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| tracing::debug!(path = %path.display(), "read error: {e}"))
        .ok()?;
    serde_json::from_str(&content)
        .map_err(|e| tracing::debug!(path = %path.display(), "parse error: {e}"))
        .ok()
}

/// Newest state per pane id. Expects `states` newest first.
pub fn latest_by_pane(states: &[PluginState]) -> HashMap<&str, &PluginState> {
    let mut map = HashMap::new();
    for st in states {
        map.entry(st.pane_id.as_str()).or_insert(st);
    }
    map
}
