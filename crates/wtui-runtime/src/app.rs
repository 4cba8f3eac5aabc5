//! Dashboard state and the event reducer behind `wtui watch`.
//!
//! All state changes go through [`Dashboard::handle`]. Pane commands are
//! run synchronously inside the reducer; their outcome lands in a status
//! line that is cleared by the next input.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use wtui_core::{SyncCounters, WorkingTree};
use wtui_git::{SortMode, sort_working_trees};
use wtui_sessions::{FlashTracker, Indicator};
use wtui_tmux::{MoveDirection, PaneInspector, PaneLayoutController, TmuxCommandRunner, WidthToggle};

use crate::affinity::{PaneAffinity, Resolution};
use crate::poll_loop::{Slice, Snapshot};

#[derive(Debug, Clone)]
pub enum Event {
    Snapshot(Arc<Snapshot>),
    Input(Command),
    Tick(Instant),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Up,
    Down,
    /// 1-based row number.
    Select(usize),
    Sort,
    /// cd a pane into the selected tree; `None` resolves the pane by affinity.
    Send(Option<u32>),
    Focus(u32),
    Move(MoveDirection),
    Width,
    Refresh,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err("empty command".to_string());
        };
        let arg = words.next();
        if words.next().is_some() {
            return Err(format!("too many arguments for {verb:?}"));
        }

        let number = |what: &str| -> Result<u32, String> {
            let raw = arg.ok_or_else(|| format!("{verb} needs a {what}"))?;
            raw.parse()
                .map_err(|_| format!("{what} must be a number, got {raw:?}"))
        };

        let cmd = match verb {
            "up" | "k" => Self::Up,
            "down" | "j" => Self::Down,
            "select" | "s" => Self::Select(number("row number")? as usize),
            "sort" => Self::Sort,
            "send" | "cd" => Self::Send(arg.map(|_| number("pane index")).transpose()?),
            "focus" | "f" => Self::Focus(number("pane index")?),
            "move" | "m" => Self::Move(arg.ok_or("move needs left or right")?.parse()?),
            "width" | "w" => Self::Width,
            "refresh" | "r" => Self::Refresh,
            "quit" | "q" | "exit" => Self::Quit,
            other => return Err(format!("unknown command {other:?}")),
        };
        if arg.is_some()
            && matches!(
                cmd,
                Self::Up | Self::Down | Self::Sort | Self::Width | Self::Refresh | Self::Quit
            )
        {
            return Err(format!("{verb} takes no argument"));
        }
        Ok(cmd)
    }
}

/// What the caller should do after an event.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Reaction {
    pub redraw: bool,
    pub repoll: Vec<Slice>,
    pub quit: bool,
}

impl Reaction {
    fn redraw() -> Self {
        Self {
            redraw: true,
            ..Self::default()
        }
    }
}

pub struct Dashboard<R> {
    snapshot: Arc<Snapshot>,
    /// `snapshot.trees` in display order.
    rows: Vec<WorkingTree>,
    sort: SortMode,
    selected: usize,
    status: Option<String>,
    affinity: PaneAffinity,
    stored_width: Option<u16>,
    flash: FlashTracker,
    animating: bool,
    now: Instant,
    inspector: PaneInspector<R>,
    layout: PaneLayoutController<R>,
}

impl<R: TmuxCommandRunner> Dashboard<R> {
    pub fn new(
        inspector: PaneInspector<R>,
        layout: PaneLayoutController<R>,
        sort: SortMode,
        flash: FlashTracker,
    ) -> Self {
        Self {
            snapshot: Arc::new(Snapshot::default()),
            rows: Vec::new(),
            sort,
            selected: 0,
            status: None,
            affinity: PaneAffinity::new(),
            stored_width: None,
            flash,
            animating: false,
            now: Instant::now(),
            inspector,
            layout,
        }
    }

    pub fn handle(&mut self, event: Event) -> Reaction {
        match event {
            Event::Snapshot(snapshot) => self.on_snapshot(snapshot, Instant::now()),
            Event::Input(cmd) => {
                self.status = None;
                self.on_command(cmd)
            }
            Event::Tick(now) => self.on_tick(now),
        }
    }

    /// An input line that did not parse. Counts as input for status clearing.
    pub fn reject_input(&mut self, reason: String) -> Reaction {
        self.status = Some(reason);
        Reaction::redraw()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn rows(&self) -> &[WorkingTree] {
        &self.rows
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn counters(&self, path: &str) -> Option<&SyncCounters> {
        self.snapshot.counters.get(path)
    }

    pub fn indicator(&self, pane_id: &str) -> Indicator {
        self.flash.indicator(pane_id, self.now)
    }

    fn selected_tree(&self) -> Option<&WorkingTree> {
        self.rows.get(self.selected)
    }

    fn on_snapshot(&mut self, snapshot: Arc<Snapshot>, now: Instant) -> Reaction {
        let keep = self.selected_tree().map(|t| t.path.clone());
        self.snapshot = snapshot;
        self.now = now;
        self.flash.observe(&self.snapshot.sessions, now);
        self.animating = self.flash.is_animating(now);
        self.resort(keep.as_deref());
        Reaction::redraw()
    }

    fn on_tick(&mut self, now: Instant) -> Reaction {
        self.now = now;
        let animating = self.flash.is_animating(now);
        // One more frame after the blink ends so the indicator settles.
        let redraw = animating || self.animating;
        self.animating = animating;
        Reaction {
            redraw,
            ..Reaction::default()
        }
    }

    /// Re-sort rows, keeping the selection on the same tree when it survives.
    fn resort(&mut self, keep: Option<&str>) {
        self.rows = sort_working_trees(&self.snapshot.trees, self.sort);
        if let Some(path) = keep
            && let Some(pos) = self.rows.iter().position(|t| t.path == path)
        {
            self.selected = pos;
        }
        self.selected = self.selected.min(self.rows.len().saturating_sub(1));
    }

    fn on_command(&mut self, cmd: Command) -> Reaction {
        let mut reaction = Reaction::redraw();
        match cmd {
            Command::Up => self.selected = self.selected.saturating_sub(1),
            Command::Down => {
                if self.selected + 1 < self.rows.len() {
                    self.selected += 1;
                }
            }
            Command::Select(n) => {
                if (1..=self.rows.len()).contains(&n) {
                    self.selected = n - 1;
                } else {
                    self.status = Some(format!("No working tree {n}"));
                }
            }
            Command::Sort => {
                self.sort = self.sort.toggle();
                let keep = self.selected_tree().map(|t| t.path.clone());
                self.resort(keep.as_deref());
                self.status = Some(format!("Sorted by {}", self.sort.as_str()));
            }
            Command::Send(pane) => {
                if self.send_selected(pane) {
                    reaction.repoll.push(Slice::Sessions);
                }
            }
            Command::Focus(index) => {
                self.status = Some(match self.inspector.focus_pane(index) {
                    Ok(_) => format!("Focused pane {index}"),
                    Err(e) => e.to_string(),
                });
            }
            Command::Move(direction) => {
                self.status = Some(match self.layout.move_current_pane(direction) {
                    Ok(()) => format!("Moved to the {} edge", direction_name(direction)),
                    Err(e) => e.to_string(),
                });
                reaction.repoll.push(Slice::Sessions);
            }
            Command::Width => self.toggle_width(),
            Command::Refresh => {
                reaction.repoll = vec![Slice::Trees, Slice::Counters, Slice::Sessions];
            }
            Command::Quit => reaction.quit = true,
        }
        reaction
    }

    /// Returns whether keys were sent.
    fn send_selected(&mut self, pane: Option<u32>) -> bool {
        let Some(tree) = self.selected_tree() else {
            self.status = Some("No working tree selected".to_string());
            return false;
        };
        let (path, name) = (tree.path.clone(), tree.name.clone());

        let index = match pane {
            Some(index) => index,
            None => match self.affinity.resolve_target(&path, &self.inspector) {
                Resolution::Pane(index) => index,
                unresolved => {
                    self.status = Some(unresolved.to_string());
                    return false;
                }
            },
        };

        match self.inspector.send_directory_change(index, &path) {
            Ok(target) => {
                if pane.is_some() {
                    self.affinity.remember(&path, target.index);
                }
                self.status = Some(format!("Sent {name} to pane {index}"));
                true
            }
            Err(e) => {
                self.status = Some(e.to_string());
                false
            }
        }
    }

    fn toggle_width(&mut self) {
        self.status = Some(match self.layout.toggle_width(self.stored_width) {
            Ok(WidthToggle::Minimized { previous_width }) => {
                self.stored_width = Some(previous_width);
                format!("Minimized (was {previous_width} columns)")
            }
            Ok(WidthToggle::Restored { width }) => format!("Restored to {width} columns"),
            Err(e) => e.to_string(),
        });
    }
}

fn direction_name(direction: MoveDirection) -> &'static str {
    match direction {
        MoveDirection::Left => "left",
        MoveDirection::Right => "right",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use wtui_core::{AssistantSession, InputState};
    use wtui_tmux::TmuxError;

    /// Fake tmux: a fixed location listing for the window plus one resizable
    /// self pane (`%0`).
    struct FakeTmux {
        listing: String,
        width: Mutex<u16>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeTmux {
        fn new(panes: &[(u32, &str, &str)]) -> Arc<Self> {
            let listing = panes
                .iter()
                .map(|(i, id, cwd)| format!("{i}\t{id}\t{cwd}"))
                .collect::<Vec<_>>()
                .join("\n");
            Arc::new(Self {
                listing,
                width: Mutex::new(80),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn sent(&self) -> Vec<String> {
            self.calls
                .lock()
                .expect("lock")
                .iter()
                .filter(|c| c.starts_with("send-keys") && c.contains(" -l "))
                .cloned()
                .collect()
        }
    }

    impl TmuxCommandRunner for FakeTmux {
        fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
            self.calls.lock().expect("lock").push(args.join(" "));
            match args[0] {
                "list-panes" => Ok(self.listing.clone()),
                "display-message" => Ok(format!("%0\t{}\t@1\n", self.width.lock().expect("lock"))),
                "resize-pane" => {
                    let x = args.iter().position(|a| *a == "-x").expect("-x");
                    *self.width.lock().expect("lock") = args[x + 1].parse().expect("width");
                    Ok(String::new())
                }
                _ => Ok(String::new()),
            }
        }
    }

    fn dashboard(fake: &Arc<FakeTmux>) -> Dashboard<Arc<FakeTmux>> {
        Dashboard::new(
            PaneInspector::new(Arc::clone(fake), Some("%0".into())),
            PaneLayoutController::new(Arc::clone(fake), Some("%0".into())),
            SortMode::Branch,
            FlashTracker::new(Duration::from_millis(1000)),
        )
    }

    fn tree(path: &str, branch: &str) -> WorkingTree {
        WorkingTree {
            path: path.into(),
            name: wtui_core::paths::last_segment(path).into(),
            branch: branch.into(),
            commit_short: "abc1234".into(),
            mtime: None,
        }
    }

    fn snapshot(trees: Vec<WorkingTree>, sessions: Vec<AssistantSession>) -> Event {
        Event::Snapshot(Arc::new(Snapshot {
            trees,
            sessions,
            ..Default::default()
        }))
    }

    fn input(line: &str) -> Event {
        Event::Input(line.parse().expect("command"))
    }

    fn three_trees() -> Vec<WorkingTree> {
        vec![
            tree("/r/zeta", "zeta"),
            tree("/r/main", "main"),
            tree("/r/alpha", "alpha"),
        ]
    }

    #[test]
    fn parse_commands() {
        assert_eq!("send".parse(), Ok(Command::Send(None)));
        assert_eq!("send 3".parse(), Ok(Command::Send(Some(3))));
        assert_eq!("move left".parse(), Ok(Command::Move(MoveDirection::Left)));
        assert_eq!(" select 2 ".parse(), Ok(Command::Select(2)));
        assert!("focus".parse::<Command>().is_err());
        assert!("focus x".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
        assert!("quit now".parse::<Command>().is_err());
        assert!("".parse::<Command>().is_err());
    }

    #[test]
    fn rows_follow_sort_mode_and_selection_follows_tree() {
        let fake = FakeTmux::new(&[]);
        let mut d = dashboard(&fake);
        d.handle(snapshot(three_trees(), vec![]));
        let names: Vec<&str> = d.rows().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["main", "alpha", "zeta"]);

        d.handle(input("select 3"));
        assert_eq!(d.rows()[d.selected()].name, "zeta");
        d.handle(input("sort"));
        assert_eq!(d.sort(), SortMode::Recent);
        assert_eq!(d.rows()[d.selected()].name, "zeta");
    }

    #[test]
    fn selection_is_clamped_when_trees_vanish() {
        let fake = FakeTmux::new(&[]);
        let mut d = dashboard(&fake);
        d.handle(snapshot(three_trees(), vec![]));
        d.handle(input("down"));
        d.handle(input("down"));
        d.handle(input("down"));
        assert_eq!(d.selected(), 2);
        d.handle(snapshot(vec![tree("/r/main", "main")], vec![]));
        assert_eq!(d.selected(), 0);
    }

    #[test]
    fn status_clears_on_next_input() {
        let fake = FakeTmux::new(&[]);
        let mut d = dashboard(&fake);
        d.handle(snapshot(three_trees(), vec![]));
        d.handle(input("select 9"));
        assert_eq!(d.status(), Some("No working tree 9"));
        d.handle(snapshot(three_trees(), vec![]));
        assert!(d.status().is_some(), "snapshots keep the status");
        d.handle(input("up"));
        assert_eq!(d.status(), None);
    }

    #[test]
    fn send_resolves_unique_pane_and_requests_session_repoll() {
        let fake = FakeTmux::new(&[(0, "%0", "/r/main"), (1, "%5", "/r/main"), (2, "%6", "/tmp")]);
        let mut d = dashboard(&fake);
        d.handle(snapshot(three_trees(), vec![]));
        let r = d.handle(input("send"));
        assert_eq!(r.repoll, vec![Slice::Sessions]);
        assert_eq!(d.status(), Some("Sent main to pane 1"));
        assert_eq!(fake.sent(), vec!["send-keys -t %5 -l cd '/r/main'"]);
    }

    #[test]
    fn send_reports_ambiguity_without_sending() {
        let fake = FakeTmux::new(&[(0, "%0", "/x"), (1, "%5", "/r/main"), (2, "%6", "/r/main")]);
        let mut d = dashboard(&fake);
        d.handle(snapshot(three_trees(), vec![]));
        let r = d.handle(input("send"));
        assert!(r.repoll.is_empty());
        assert!(d.status().is_some_and(|s| s.contains("1, 2")));
        assert!(fake.sent().is_empty());

        d.handle(input("send 2"));
        assert_eq!(d.status(), Some("Sent main to pane 2"));
        // The explicit send is remembered.
        d.handle(input("send"));
        assert_eq!(d.status(), Some("Sent main to pane 2"));
        assert_eq!(fake.sent().len(), 2);
    }

    #[test]
    fn send_to_self_is_refused() {
        let fake = FakeTmux::new(&[(0, "%0", "/r/main")]);
        let mut d = dashboard(&fake);
        d.handle(snapshot(three_trees(), vec![]));
        d.handle(input("send 0"));
        assert_eq!(d.status(), Some("Pane 0 is the current pane"));
        d.handle(input("send"));
        assert_eq!(d.status(), Some("No pane is open in this working tree"));
    }

    #[test]
    fn width_toggle_stores_and_restores() {
        let fake = FakeTmux::new(&[]);
        let mut d = dashboard(&fake);
        d.handle(input("width"));
        assert_eq!(d.status(), Some("Minimized (was 80 columns)"));
        assert_eq!(*fake.width.lock().expect("lock"), wtui_tmux::MIN_PANE_WIDTH);
        d.handle(input("width"));
        assert_eq!(d.status(), Some("Restored to 80 columns"));
        assert_eq!(*fake.width.lock().expect("lock"), 80);
    }

    #[test]
    fn ticks_redraw_only_while_flashing() {
        let fake = FakeTmux::new(&[]);
        let mut d = dashboard(&fake);
        let t0 = Instant::now();
        assert!(!d.handle(Event::Tick(t0)).redraw);

        let waiting = AssistantSession {
            pane_id: "%5".into(),
            input_state: InputState::Waiting,
            ..Default::default()
        };
        d.handle(snapshot(vec![], vec![waiting]));
        let start = Instant::now();
        assert!(d.handle(Event::Tick(start + Duration::from_millis(500))).redraw);
        assert_eq!(d.indicator("%5"), Indicator::FlashDim);
        // Final frame once the blink is over, then quiet.
        assert!(d.handle(Event::Tick(start + Duration::from_secs(2))).redraw);
        assert_eq!(d.indicator("%5"), Indicator::Solid);
        assert!(!d.handle(Event::Tick(start + Duration::from_secs(3))).redraw);
    }

    #[test]
    fn refresh_and_quit() {
        let fake = FakeTmux::new(&[]);
        let mut d = dashboard(&fake);
        assert_eq!(d.handle(input("refresh")).repoll.len(), 3);
        assert!(d.handle(input("q")).quit);
    }
}
