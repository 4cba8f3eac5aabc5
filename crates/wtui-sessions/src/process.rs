//! Host process table snapshot and assistant process-tree classification.

use std::collections::{HashMap, HashSet, VecDeque};
use std::process::{Command, Stdio};

/// Executable name matched as a whole argv token (after stripping directories).
const ASSISTANT_BIN: &str = "claude";

/// Package identifiers that appear in argv when the assistant runs under node.
const ASSISTANT_PACKAGES: &[&str] = &["@anthropic-ai/claude-code", "claude-code/cli.js"];

/// One entry from `ps -eo pid=,ppid=,args=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub ppid: u32,
    pub args: String,
}

/// Snapshot of all processes with a parent → children index.
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    by_pid: HashMap<u32, ProcessInfo>,
    children: HashMap<u32, Vec<u32>>,
}

impl ProcessTable {
    pub fn from_entries(entries: impl IntoIterator<Item = ProcessInfo>) -> Self {
        let mut table = Self::default();
        for info in entries {
            table.children.entry(info.ppid).or_default().push(info.pid);
            table.by_pid.insert(info.pid, info);
        }
        for kids in table.children.values_mut() {
            kids.sort_unstable();
        }
        table
    }

    /// Parse `ps -eo pid=,ppid=,args=` output. Malformed lines are skipped.
    pub fn parse(output: &str) -> Self {
        Self::from_entries(output.lines().filter_map(parse_ps_line))
    }

    pub fn len(&self) -> usize {
        self.by_pid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pid.is_empty()
    }

    pub fn get(&self, pid: u32) -> Option<&ProcessInfo> {
        self.by_pid.get(&pid)
    }

    pub fn children(&self, pid: u32) -> &[u32] {
        self.children.get(&pid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `root` or any descendant looks like the assistant.
    ///
    /// The root is checked first, then descendants breadth-first.
    pub fn contains_assistant(&self, root: u32) -> bool {
        if self.get(root).is_some_and(|p| is_assistant_command(&p.args)) {
            return true;
        }
        let mut seen: HashSet<u32> = HashSet::from([root]);
        let mut queue: VecDeque<u32> = self.children(root).iter().copied().collect();
        while let Some(pid) = queue.pop_front() {
            if !seen.insert(pid) {
                continue;
            }
            if self.get(pid).is_some_and(|p| is_assistant_command(&p.args)) {
                return true;
            }
            queue.extend(self.children(pid).iter().copied());
        }
        false
    }
}

fn parse_ps_line(line: &str) -> Option<ProcessInfo> {
    let s = line.trim_start();
    let (pid, rest) = s.split_once(|c: char| c.is_ascii_whitespace())?;
    let rest = rest.trim_start();
    let (ppid, args) = match rest.split_once(|c: char| c.is_ascii_whitespace()) {
        Some((ppid, args)) => (ppid, args.trim()),
        None => (rest.trim_end(), ""),
    };
    Some(ProcessInfo {
        pid: pid.parse().ok()?,
        ppid: ppid.parse().ok()?,
        args: args.to_string(),
    })
}

/// Signature match on a full command line.
///
/// The short name must be an entire token (`/usr/local/bin/claude`, not
/// `claudette`); package identifiers match as substrings.
pub fn is_assistant_command(args: &str) -> bool {
    if ASSISTANT_PACKAGES.iter().any(|pkg| args.contains(pkg)) {
        return true;
    }
    args.split_whitespace()
        .any(|token| token.rsplit('/').next() == Some(ASSISTANT_BIN))
}

/// Where process snapshots come from.
pub trait ProcessTableSource: Send + Sync {
    /// Full table; empty when unavailable.
    fn snapshot(&self) -> ProcessTable;
}

impl<T: ProcessTableSource + ?Sized> ProcessTableSource for std::sync::Arc<T> {
    fn snapshot(&self) -> ProcessTable {
        (**self).snapshot()
    }
}

/// Snapshots via one `ps` invocation.
#[derive(Debug, Clone, Default)]
pub struct PsProcessTable;

impl ProcessTableSource for PsProcessTable {
    fn snapshot(&self) -> ProcessTable {
        let output = match Command::new("ps")
            .args(["-eo", "pid=,ppid=,args="])
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
        {
            Ok(o) if o.status.success() => o,
            Ok(o) => {
                tracing::debug!(status = %o.status, "ps exited non-zero");
                return ProcessTable::default();
            }
            Err(e) => {
                tracing::debug!("ps unavailable: {e}");
                return ProcessTable::default();
            }
        };
        ProcessTable::parse(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Answers "is the assistant running under this pid" from a fresh snapshot.
///
/// The process tree can change right after the snapshot, so answers may be
/// stale by the time they are used.
pub struct ProcessClassifier<S> {
    source: S,
}

impl<S: ProcessTableSource> ProcessClassifier<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn is_assistant_running(&self, root_pid: u32) -> bool {
        self.source.snapshot().contains_assistant(root_pid)
    }
}
