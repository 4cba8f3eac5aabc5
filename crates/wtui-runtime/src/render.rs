//! Plain-text frames for `wtui watch` and `wtui ls`.

use chrono::{DateTime, Utc};
use wtui_core::paths::normalize_path_for_compare;
use wtui_core::{AssistantSession, InputState, SyncCounters, WorkingTree};
use wtui_git::{SortMode, sort_working_trees};
use wtui_sessions::Indicator;
use wtui_tmux::TmuxCommandRunner;

use crate::app::Dashboard;
use crate::poll_loop::Snapshot;

const NAME_WIDTH: usize = 22;
const BRANCH_WIDTH: usize = 28;

const COMMAND_HINT: &str =
    "up | down | select N | sort | send [pane] | focus N | move left|right | width | refresh | quit";

/// Full dashboard frame: header, one block per tree, sessions outside any
/// tree, then the status line (or the command hint when there is none).
pub fn render_dashboard<R: TmuxCommandRunner>(d: &Dashboard<R>, title: &str) -> String {
    let snapshot = d.snapshot();
    let now = Utc::now();
    let mut out = header(title, d.sort(), snapshot);

    if d.rows().is_empty() {
        out.push_str("  (no working trees)\n");
    }
    for (i, tree) in d.rows().iter().enumerate() {
        let marker = if i == d.selected() { '>' } else { ' ' };
        out.push_str(&tree_line(marker, i + 1, tree, d.counters(&tree.path), now));
        for s in sessions_in_tree(&snapshot.sessions, &tree.path) {
            out.push_str(&session_line(s, d.indicator(&s.pane_id)));
        }
    }
    push_orphans(&mut out, snapshot, |s| d.indicator(&s.pane_id));

    out.push('\n');
    out.push_str(d.status().unwrap_or(COMMAND_HINT));
    out.push('\n');
    out
}

/// One-shot listing: same layout without selection or blinking.
pub fn render_listing(snapshot: &Snapshot, sort: SortMode, title: &str) -> String {
    let now = Utc::now();
    let mut out = header(title, sort, snapshot);
    let steady = |s: &AssistantSession| {
        if s.input_state.is_waiting() {
            Indicator::Solid
        } else {
            Indicator::Off
        }
    };
    for (i, tree) in sort_working_trees(&snapshot.trees, sort).iter().enumerate() {
        out.push_str(&tree_line(' ', i + 1, tree, snapshot.counters.get(&tree.path), now));
        for s in sessions_in_tree(&snapshot.sessions, &tree.path) {
            out.push_str(&session_line(s, steady(s)));
        }
    }
    push_orphans(&mut out, snapshot, steady);
    out
}

fn header(title: &str, sort: SortMode, snapshot: &Snapshot) -> String {
    format!(
        "wtui  {title}  [sort: {}]  {} trees, {} sessions\n\n",
        sort.as_str(),
        snapshot.trees.len(),
        snapshot.sessions.len()
    )
}

fn push_orphans(out: &mut String, snapshot: &Snapshot, indicator: impl Fn(&AssistantSession) -> Indicator) {
    let orphans: Vec<&AssistantSession> = snapshot
        .sessions
        .iter()
        .filter(|s| !snapshot.trees.iter().any(|t| is_within(&s.cwd, &t.path)))
        .collect();
    if orphans.is_empty() {
        return;
    }
    out.push_str("\n  other sessions\n");
    for s in orphans {
        out.push_str(&session_line(s, indicator(s)));
    }
}

/// Sessions whose cwd is the tree or a directory below it.
pub fn sessions_in_tree<'a>(sessions: &'a [AssistantSession], tree_path: &str) -> Vec<&'a AssistantSession> {
    sessions.iter().filter(|s| is_within(&s.cwd, tree_path)).collect()
}

fn is_within(cwd: &str, tree_path: &str) -> bool {
    let cwd = normalize_path_for_compare(cwd);
    let root = normalize_path_for_compare(tree_path);
    cwd == root || cwd.strip_prefix(root).is_some_and(|rest| rest.starts_with('/'))
}

fn tree_line(
    marker: char,
    row: usize,
    tree: &WorkingTree,
    counters: Option<&SyncCounters>,
    now: DateTime<Utc>,
) -> String {
    let age = tree
        .mtime
        .map(|m| relative_time((now - m).num_seconds()))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{marker} {row:>2}  {:<nw$} {:<bw$} {:<7}  {:<18} {age}\n",
        truncate(&tree.name, NAME_WIDTH),
        truncate(tree.branch_label(), BRANCH_WIDTH),
        tree.commit_short,
        counters.map(format_counters).unwrap_or_default(),
        nw = NAME_WIDTH,
        bw = BRANCH_WIDTH,
    )
}

fn session_line(s: &AssistantSession, indicator: Indicator) -> String {
    let mut line = format!(
        "        {} pane {:<3} {:<8}",
        glyph(s.input_state, indicator),
        s.pane_index,
        s.input_state.as_str()
    );
    if let Some(summary) = &s.summary {
        line.push(' ');
        line.push_str(summary);
    }
    if s.is_devcontainer {
        line.push_str(&format!("  [{}]", s.hostname.as_deref().unwrap_or("devcontainer")));
    }
    line.push('\n');
    line
}

fn glyph(state: InputState, indicator: Indicator) -> char {
    match indicator {
        Indicator::FlashOn | Indicator::Solid => '●',
        Indicator::FlashDim => '○',
        Indicator::Off => match state {
            InputState::Waiting => '●',
            InputState::Working => '▶',
            InputState::Unknown => '·',
        },
    }
}

/// `↑2 ↓1 +3 ~1 ?4`, omitting zero fields; `clean` when everything is zero.
pub fn format_counters(c: &SyncCounters) -> String {
    let parts: Vec<String> = [
        ('↑', c.ahead),
        ('↓', c.behind),
        ('+', c.staged),
        ('~', c.modified),
        ('?', c.untracked),
    ]
    .into_iter()
    .filter(|(_, n)| *n > 0)
    .map(|(sym, n)| format!("{sym}{n}"))
    .collect();
    if parts.is_empty() {
        "clean".to_string()
    } else {
        parts.join(" ")
    }
}

/// Relative-time helper: seconds -> human string.
pub fn relative_time(seconds: i64) -> String {
    let s = seconds.unsigned_abs();
    if s < 60 {
        "just now".to_string()
    } else if s < 3600 {
        format!("{}m", s / 60)
    } else if s < 86400 {
        format!("{}h", s / 3600)
    } else if s < 86400 * 30 {
        format!("{}d", s / 86400)
    } else {
        format!("{}w", s / (86400 * 7))
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut cut: String = s.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
