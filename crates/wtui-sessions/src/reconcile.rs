//! Unified assistant-session list from process-tree scans and plugin state.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use wtui_core::paths::normalize_path_for_compare;
use wtui_core::{AssistantSession, InputState, Pane, PluginState};
use wtui_tmux::{PaneInspector, TmuxCommandRunner};

use crate::plugin_state::{default_state_dir, latest_by_pane, load_plugin_states};
use crate::process::{ProcessTable, ProcessTableSource};
use crate::transcript::{default_projects_dir, summarize_transcripts};

/// Where the on-disk inputs live. `None` disables that input.
#[derive(Debug, Clone, Default)]
pub struct SessionSources {
    pub plugin_state_dir: Option<PathBuf>,
    pub projects_dir: Option<PathBuf>,
}

impl SessionSources {
    /// Default per-user locations under `$HOME/.claude`.
    pub fn from_home() -> Self {
        Self {
            plugin_state_dir: default_state_dir(),
            projects_dir: default_projects_dir(),
        }
    }
}

/// A session together with how it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// Assistant process seen in the pane's process tree.
    Local(AssistantSession),
    /// Only known through a devcontainer plugin state file.
    Devcontainer(AssistantSession),
}

impl Detection {
    pub fn session(&self) -> &AssistantSession {
        match self {
            Self::Local(s) | Self::Devcontainer(s) => s,
        }
    }

    pub fn into_session(self) -> AssistantSession {
        match self {
            Self::Local(s) | Self::Devcontainer(s) => s,
        }
    }

    fn outranks(&self, other: &Detection) -> bool {
        matches!((self, other), (Self::Local(_), Self::Devcontainer(_)))
    }
}

/// One session per pane id. A local detection replaces a devcontainer one
/// for the same pane; otherwise the first detection is kept. Sorted by pane
/// index.
pub fn merge_detections(detections: impl IntoIterator<Item = Detection>) -> Vec<AssistantSession> {
    let mut by_pane: HashMap<String, Detection> = HashMap::new();
    for d in detections {
        match by_pane.get(&d.session().pane_id) {
            Some(existing) if !d.outranks(existing) => {}
            _ => {
                by_pane.insert(d.session().pane_id.clone(), d);
            }
        }
    }
    let mut sessions: Vec<AssistantSession> =
        by_pane.into_values().map(Detection::into_session).collect();
    sessions.sort_by(|a, b| {
        a.pane_index
            .cmp(&b.pane_index)
            .then_with(|| a.pane_id.cmp(&b.pane_id))
    });
    sessions
}

/// Panes (excluding self) whose process tree contains the assistant.
pub fn local_detections(
    panes: &[&Pane],
    table: &ProcessTable,
    states_by_pane: &HashMap<&str, &PluginState>,
    summaries: &HashMap<String, String>,
) -> Vec<Detection> {
    panes
        .iter()
        .filter(|p| p.pid.is_some_and(|pid| table.contains_assistant(pid)))
        .map(|p| {
            let state = states_by_pane.get(p.id.as_str());
            Detection::Local(AssistantSession {
                pane_index: p.index,
                pane_id: p.id.clone(),
                cwd: p.cwd.clone(),
                window_name: p.window_name.clone(),
                pid: p.pid,
                summary: summary_for(summaries, &p.cwd),
                input_state: state.map_or(InputState::Unknown, |s| s.state.into()),
                hostname: state.and_then(|s| s.hostname.clone()),
                is_devcontainer: false,
            })
        })
        .collect()
}

/// Fresh devcontainer states whose pane is alive and not self.
pub fn devcontainer_detections(
    panes: &[&Pane],
    states: &[PluginState],
    summaries: &HashMap<String, String>,
) -> Vec<Detection> {
    states
        .iter()
        .filter(|st| st.is_devcontainer)
        .filter_map(|st| {
            let Some(pane) = panes.iter().find(|p| p.id == st.pane_id) else {
                tracing::trace!(pane = %st.pane_id, "devcontainer state for unknown pane");
                return None;
            };
            Some(Detection::Devcontainer(AssistantSession {
                pane_index: pane.index,
                pane_id: pane.id.clone(),
                cwd: st.cwd.clone(),
                window_name: pane.window_name.clone(),
                pid: pane.pid,
                summary: summary_for(summaries, &st.cwd),
                input_state: st.state.into(),
                hostname: st.hostname.clone(),
                is_devcontainer: true,
            }))
        })
        .collect()
}

fn summary_for(summaries: &HashMap<String, String>, cwd: &str) -> Option<String> {
    summaries.get(normalize_path_for_compare(cwd)).cloned()
}

pub struct SessionReconciler<R, P> {
    inspector: PaneInspector<R>,
    processes: P,
    sources: SessionSources,
}

impl<R: TmuxCommandRunner, P: ProcessTableSource> SessionReconciler<R, P> {
    pub fn new(inspector: PaneInspector<R>, processes: P, sources: SessionSources) -> Self {
        Self {
            inspector,
            processes,
            sources,
        }
    }

    pub fn detect_sessions(&self) -> Vec<AssistantSession> {
        self.detect_at(Utc::now())
    }

    /// One detection pass evaluated at `now`. Takes a single process-table
    /// snapshot for all panes.
    pub fn detect_at(&self, now: DateTime<Utc>) -> Vec<AssistantSession> {
        let panes = match self.inspector.panes() {
            Ok(p) => p,
            Err(e) => {
                tracing::debug!("session scan: pane listing failed: {e}");
                return Vec::new();
            }
        };
        let candidates: Vec<&Pane> = panes.iter().filter(|p| !self.inspector.is_self(p)).collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let states = self
            .sources
            .plugin_state_dir
            .as_deref()
            .map(|dir| load_plugin_states(dir, now))
            .unwrap_or_default();
        let summaries = self
            .sources
            .projects_dir
            .as_deref()
            .map(|dir| summarize_transcripts(dir, SystemTime::from(now)))
            .unwrap_or_default();
        let table = self.processes.snapshot();

        let local = local_detections(&candidates, &table, &latest_by_pane(&states), &summaries);
        let devcontainer = devcontainer_detections(&candidates, &states, &summaries);
        tracing::debug!(
            local = local.len(),
            devcontainer = devcontainer.len(),
            "session scan"
        );
        merge_detections(local.into_iter().chain(devcontainer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wtui_core::PluginLifecycle;

    fn pane(index: u32, id: &str, cwd: &str, pid: u32) -> Pane {
        Pane {
            index,
            id: id.into(),
            cwd: cwd.into(),
            command: "zsh".into(),
            pid: Some(pid),
            window_name: "dev".into(),
        }
    }

    fn state(pane_id: &str, lifecycle: PluginLifecycle, devcontainer: bool) -> PluginState {
        PluginState {
            session_id: format!("s-{pane_id}"),
            cwd: "/workspaces/app".into(),
            state: lifecycle,
            pane_id: pane_id.into(),
            timestamp: Utc::now(),
            hostname: devcontainer.then(|| "devbox".to_string()),
            is_devcontainer: devcontainer,
        }
    }

    fn claude_under(shell_pid: u32) -> ProcessTable {
        ProcessTable::parse(&format!(
            "{shell_pid} 1 -zsh\n{} {shell_pid} /usr/local/bin/claude\n",
            shell_pid + 1
        ))
    }

    #[test]
    fn local_without_plugin_state_is_unknown() {
        let p = pane(1, "%1", "/repo/wt", 100);
        let mut summaries = HashMap::new();
        summaries.insert("/repo/wt".to_string(), "fix login".to_string());
        let got = local_detections(&[&p], &claude_under(100), &HashMap::new(), &summaries);
        assert_eq!(got.len(), 1);
        let s = got[0].session();
        assert_eq!(s.input_state, InputState::Unknown);
        assert_eq!(s.summary.as_deref(), Some("fix login"));
        assert!(!s.is_devcontainer);
    }

    #[test]
    fn local_takes_input_state_from_matching_pane_only() {
        let p1 = pane(1, "%1", "/a", 100);
        let p2 = pane(2, "%2", "/b", 200);
        let mut table_text = String::new();
        table_text.push_str("100 1 zsh\n101 100 claude\n200 1 zsh\n201 200 claude\n");
        let table = ProcessTable::parse(&table_text);
        let st = state("%2", PluginLifecycle::Waiting, false);
        let by_pane: HashMap<&str, &PluginState> = HashMap::from([("%2", &st)]);
        let got = local_detections(&[&p1, &p2], &table, &by_pane, &HashMap::new());
        assert_eq!(got[0].session().input_state, InputState::Unknown);
        assert_eq!(got[1].session().input_state, InputState::Waiting);
    }

    #[test]
    fn pane_without_assistant_is_not_a_session() {
        let p = pane(1, "%1", "/a", 100);
        let table = ProcessTable::parse("100 1 zsh\n101 100 vim\n");
        assert!(local_detections(&[&p], &table, &HashMap::new(), &HashMap::new()).is_empty());
    }

    #[test]
    fn devcontainer_requires_live_pane() {
        let p = pane(3, "%3", "/host/path", 300);
        let states = vec![
            state("%3", PluginLifecycle::Working, true),
            state("%99", PluginLifecycle::Waiting, true),
            state("%3", PluginLifecycle::Waiting, false),
        ];
        let got = devcontainer_detections(&[&p], &states, &HashMap::new());
        assert_eq!(got.len(), 1);
        let s = got[0].session();
        assert_eq!(s.pane_index, 3);
        assert_eq!(s.cwd, "/workspaces/app");
        assert_eq!(s.hostname.as_deref(), Some("devbox"));
        assert_eq!(s.pid, Some(300));
        assert!(s.is_devcontainer);
    }

    #[test]
    fn merge_prefers_local_for_same_pane() {
        let local = AssistantSession {
            pane_index: 2,
            pane_id: "%2".into(),
            cwd: "/host".into(),
            ..Default::default()
        };
        let dev = AssistantSession {
            pane_index: 2,
            pane_id: "%2".into(),
            cwd: "/workspaces/app".into(),
            is_devcontainer: true,
            ..Default::default()
        };
        let other = AssistantSession {
            pane_index: 1,
            pane_id: "%1".into(),
            ..Default::default()
        };

        // Order of arrival must not matter.
        for input in [
            vec![
                Detection::Devcontainer(dev.clone()),
                Detection::Local(local.clone()),
                Detection::Local(other.clone()),
            ],
            vec![
                Detection::Local(local.clone()),
                Detection::Devcontainer(dev.clone()),
                Detection::Local(other.clone()),
            ],
        ] {
            let merged = merge_detections(input);
            assert_eq!(merged.len(), 2);
            assert_eq!(merged[0].pane_id, "%1");
            assert_eq!(merged[1], local);
        }
    }
}
