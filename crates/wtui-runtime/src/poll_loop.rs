//! Poll loop: three independent slices (trees, counters, sessions) feeding
//! one published snapshot.
//!
//! Each slice runs in its own task on its own timer, so a hung git or tmux
//! call only stalls that slice. Every publish replaces the whole `Arc`; the
//! consumer never sees a half-updated snapshot.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Notify, watch};
use tokio::task::JoinSet;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

use wtui_core::{AssistantSession, SyncCounters, WorkingTree};
use wtui_git::{GitCommandRunner, fetch_sync_counters, list_working_trees};
use wtui_sessions::{ProcessTableSource, SessionReconciler};
use wtui_tmux::TmuxCommandRunner;

use crate::config::Config;

/// Published engine state. Trees are in listing order; display ordering is
/// the consumer's job.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub trees: Vec<WorkingTree>,
    /// Only ever holds paths present in `trees`.
    pub counters: HashMap<String, SyncCounters>,
    pub sessions: Vec<AssistantSession>,
    /// Bumped on every publish.
    pub revision: u64,
}

impl Snapshot {
    pub fn tree_paths(&self) -> Vec<String> {
        self.trees.iter().map(|t| t.path.clone()).collect()
    }

    /// New snapshot with `trees` swapped in, or `None` when nothing changed.
    /// Counters for paths that disappeared are dropped.
    pub fn with_trees(&self, trees: Vec<WorkingTree>) -> Option<Snapshot> {
        if self.trees == trees {
            return None;
        }
        let mut counters = self.counters.clone();
        counters.retain(|path, _| trees.iter().any(|t| &t.path == path));
        Some(Snapshot {
            trees,
            counters,
            sessions: self.sessions.clone(),
            revision: self.revision + 1,
        })
    }

    /// Counters restricted to the current tree set.
    pub fn with_counters(&self, mut counters: HashMap<String, SyncCounters>) -> Option<Snapshot> {
        counters.retain(|path, _| self.trees.iter().any(|t| &t.path == path));
        if self.counters == counters {
            return None;
        }
        Some(Snapshot {
            counters,
            trees: self.trees.clone(),
            sessions: self.sessions.clone(),
            revision: self.revision + 1,
        })
    }

    pub fn with_sessions(&self, sessions: Vec<AssistantSession>) -> Option<Snapshot> {
        if self.sessions == sessions {
            return None;
        }
        Some(Snapshot {
            sessions,
            trees: self.trees.clone(),
            counters: self.counters.clone(),
            revision: self.revision + 1,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slice {
    Trees,
    Counters,
    Sessions,
}

/// Wakes a slice ahead of its timer. A request made while the slice is busy
/// is kept and runs right after the current poll.
#[derive(Debug, Clone, Default)]
pub struct RepollHandle {
    trees: Arc<Notify>,
    counters: Arc<Notify>,
    sessions: Arc<Notify>,
}

impl RepollHandle {
    pub fn request(&self, slice: Slice) {
        self.notify(slice).notify_one();
    }

    fn notify(&self, slice: Slice) -> &Notify {
        match slice {
            Slice::Trees => &self.trees,
            Slice::Counters => &self.counters,
            Slice::Sessions => &self.sessions,
        }
    }
}

/// Per-slice periods. `None` polls once and then only on request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cadence {
    pub trees: Option<Duration>,
    pub counters: Option<Duration>,
    pub sessions: Option<Duration>,
}

impl Cadence {
    pub fn from_config(config: &Config) -> Self {
        Self {
            trees: config.tree_interval(),
            counters: config.counters_interval(),
            sessions: config.sessions_interval(),
        }
    }
}

pub struct PollLoop<G, T, P> {
    git: Arc<G>,
    reconciler: Arc<SessionReconciler<T, P>>,
    root: PathBuf,
    cadence: Cadence,
}

/// A running loop. Dropping it stops every slice.
pub struct RunningLoop {
    pub snapshots: watch::Receiver<Arc<Snapshot>>,
    pub repoll: RepollHandle,
    _tasks: JoinSet<()>,
}

impl<G, T, P> PollLoop<G, T, P>
where
    G: GitCommandRunner + 'static,
    T: TmuxCommandRunner + 'static,
    P: ProcessTableSource + 'static,
{
    pub fn new(
        git: Arc<G>,
        reconciler: Arc<SessionReconciler<T, P>>,
        root: PathBuf,
        cadence: Cadence,
    ) -> Self {
        Self {
            git,
            reconciler,
            root,
            cadence,
        }
    }

    /// Start the three slices. Each polls once immediately.
    pub fn spawn(self) -> RunningLoop {
        let (tx, rx) = watch::channel(Arc::new(Snapshot::default()));
        let tx = Arc::new(tx);
        let repoll = RepollHandle::default();
        let mut tasks = JoinSet::new();

        tasks.spawn(trees_slice(
            self.git.clone(),
            self.root,
            self.cadence.trees,
            Arc::clone(&tx),
            repoll.clone(),
        ));
        tasks.spawn(counters_slice(
            self.git,
            self.cadence.counters,
            Arc::clone(&tx),
            repoll.clone(),
        ));
        tasks.spawn(sessions_slice(
            self.reconciler,
            self.cadence.sessions,
            tx,
            repoll.clone(),
        ));
        tracing::info!(cadence = ?self.cadence, "poll loop started");

        RunningLoop {
            snapshots: rx,
            repoll,
            _tasks: tasks,
        }
    }
}

type Publisher = Arc<watch::Sender<Arc<Snapshot>>>;

fn publish(tx: &Publisher, update: impl FnOnce(&Snapshot) -> Option<Snapshot>) -> bool {
    tx.send_if_modified(|current| match update(current) {
        Some(next) => {
            *current = Arc::new(next);
            true
        }
        None => false,
    })
}

async fn trees_slice<G: GitCommandRunner + 'static>(
    git: Arc<G>,
    root: PathBuf,
    period: Option<Duration>,
    tx: Publisher,
    repoll: RepollHandle,
) {
    let root = Arc::new(root);
    let mut ticker = ticker(period);
    loop {
        let (git, dir) = (Arc::clone(&git), Arc::clone(&root));
        match tokio::task::spawn_blocking(move || list_working_trees(&*git, &dir)).await {
            Ok(trees) => {
                let before = tx.borrow().tree_paths();
                if publish(&tx, |s| s.with_trees(trees)) {
                    tracing::debug!(count = tx.borrow().trees.len(), "trees updated");
                    if tx.borrow().tree_paths() != before {
                        repoll.request(Slice::Counters);
                    }
                }
            }
            Err(e) => tracing::debug!("tree poll task failed: {e}"),
        }
        wait_next(&mut ticker, repoll.notify(Slice::Trees)).await;
    }
}

async fn counters_slice<G: GitCommandRunner + 'static>(
    git: Arc<G>,
    period: Option<Duration>,
    tx: Publisher,
    repoll: RepollHandle,
) {
    let mut ticker = ticker(period);
    loop {
        let paths = tx.borrow().tree_paths();
        let counters = fetch_sync_counters(Arc::clone(&git), paths).await;
        if publish(&tx, |s| s.with_counters(counters)) {
            tracing::debug!("counters updated");
        }
        wait_next(&mut ticker, repoll.notify(Slice::Counters)).await;
    }
}

async fn sessions_slice<T, P>(
    reconciler: Arc<SessionReconciler<T, P>>,
    period: Option<Duration>,
    tx: Publisher,
    repoll: RepollHandle,
) where
    T: TmuxCommandRunner + 'static,
    P: ProcessTableSource + 'static,
{
    let mut ticker = ticker(period);
    loop {
        let r = Arc::clone(&reconciler);
        match tokio::task::spawn_blocking(move || r.detect_sessions()).await {
            Ok(sessions) => {
                if publish(&tx, |s| s.with_sessions(sessions)) {
                    tracing::debug!(count = tx.borrow().sessions.len(), "sessions updated");
                }
            }
            Err(e) => tracing::debug!("session poll task failed: {e}"),
        }
        wait_next(&mut ticker, repoll.notify(Slice::Sessions)).await;
    }
}

/// First tick is one period out; the initial poll already ran.
fn ticker(period: Option<Duration>) -> Option<Interval> {
    period.map(|p| {
        let mut t = interval_at(Instant::now() + p, p);
        t.set_missed_tick_behavior(MissedTickBehavior::Delay);
        t
    })
}

async fn wait_next(ticker: &mut Option<Interval>, wake: &Notify) {
    match ticker {
        Some(t) => {
            tokio::select! {
                _ = t.tick() => {}
                () = wake.notified() => t.reset(),
            }
        }
        None => wake.notified().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;
    use wtui_git::GitError;
    use wtui_sessions::{ProcessTable, SessionSources};
    use wtui_tmux::{PaneInspector, TmuxError};

    fn tree(path: &str) -> WorkingTree {
        WorkingTree {
            path: path.into(),
            name: wtui_core::paths::last_segment(path).into(),
            branch: "b".into(),
            ..Default::default()
        }
    }

    fn counters(ahead: u32) -> SyncCounters {
        SyncCounters {
            ahead,
            ..Default::default()
        }
    }

    #[test]
    fn with_trees_prunes_vanished_counters() {
        let base = Snapshot {
            trees: vec![tree("/r/a"), tree("/r/b")],
            counters: HashMap::from([("/r/a".into(), counters(1)), ("/r/b".into(), counters(2))]),
            ..Default::default()
        };
        let next = base.with_trees(vec![tree("/r/b")]).expect("changed");
        assert_eq!(next.revision, 1);
        assert_eq!(next.counters.len(), 1);
        assert!(next.counters.contains_key("/r/b"));
        assert!(base.with_trees(base.trees.clone()).is_none());
    }

    #[test]
    fn with_counters_ignores_unknown_paths() {
        let base = Snapshot {
            trees: vec![tree("/r/a")],
            ..Default::default()
        };
        let next = base
            .with_counters(HashMap::from([
                ("/r/a".into(), counters(3)),
                ("/r/gone".into(), counters(9)),
            ]))
            .expect("changed");
        assert_eq!(next.counters.keys().collect::<Vec<_>>(), vec!["/r/a"]);
        assert!(next.with_counters(next.counters.clone()).is_none());
    }

    #[test]
    fn unchanged_sessions_do_not_bump_revision() {
        let base = Snapshot::default();
        assert!(base.with_sessions(Vec::new()).is_none());
        let s = AssistantSession {
            pane_id: "%1".into(),
            ..Default::default()
        };
        assert_eq!(base.with_sessions(vec![s]).expect("changed").revision, 1);
    }

    struct FakeGit {
        porcelain: Mutex<String>,
    }

    impl GitCommandRunner for FakeGit {
        fn run(&self, _cwd: &Path, args: &[&str]) -> Result<String, GitError> {
            match args {
                ["worktree", "list", "--porcelain"] => {
                    Ok(self.porcelain.lock().expect("lock").clone())
                }
                ["status", "--porcelain"] => Ok(" M src/lib.rs\n?? notes.txt\n".into()),
                ["rev-list", ..] => Ok("2\t1\n".into()),
                _ => Err(GitError::CommandFailed(format!("unexpected {args:?}"))),
            }
        }
    }

    struct NoPanes;

    impl TmuxCommandRunner for NoPanes {
        fn run(&self, _args: &[&str]) -> Result<String, TmuxError> {
            Ok(String::new())
        }
    }

    struct EmptyPs;

    impl ProcessTableSource for EmptyPs {
        fn snapshot(&self) -> ProcessTable {
            ProcessTable::default()
        }
    }

    fn porcelain(paths: &[&str]) -> String {
        paths
            .iter()
            .map(|p| format!("worktree {p}\nHEAD 0123456789abcdef\nbranch refs/heads/main\n"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn wait_for(
        rx: &mut watch::Receiver<Arc<Snapshot>>,
        pred: impl Fn(&Snapshot) -> bool,
    ) -> Arc<Snapshot> {
        let fut = async {
            loop {
                {
                    let snap = rx.borrow_and_update();
                    if pred(&**snap) {
                        return Arc::clone(&*snap);
                    }
                }
                rx.changed().await.expect("loop alive");
            }
        };
        tokio::time::timeout(Duration::from_secs(5), fut)
            .await
            .expect("snapshot in time")
    }

    #[tokio::test]
    async fn zero_interval_polls_once_then_on_request() {
        let git = Arc::new(FakeGit {
            porcelain: Mutex::new(porcelain(&["/nonexistent/main"])),
        });
        let reconciler = Arc::new(SessionReconciler::new(
            PaneInspector::new(NoPanes, Some("%0".into())),
            EmptyPs,
            SessionSources::default(),
        ));
        let mut running = PollLoop::new(
            Arc::clone(&git),
            reconciler,
            PathBuf::from("/nonexistent/main"),
            Cadence::default(),
        )
        .spawn();

        let snap = wait_for(&mut running.snapshots, |s| !s.counters.is_empty()).await;
        assert_eq!(snap.trees.len(), 1);
        let c = snap.counters["/nonexistent/main"];
        assert_eq!((c.ahead, c.behind, c.modified, c.untracked), (2, 1, 1, 1));

        *git.porcelain.lock().expect("lock") = porcelain(&["/nonexistent/main", "/nonexistent/feat"]);
        running.repoll.request(Slice::Trees);
        let snap = wait_for(&mut running.snapshots, |s| s.counters.len() == 2).await;
        assert_eq!(snap.trees.len(), 2);
        assert!(snap.sessions.is_empty());
    }
}
