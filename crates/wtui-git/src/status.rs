//! Ahead/behind and working-directory counters per tree.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinSet;
use wtui_core::SyncCounters;

use crate::error::GitError;
use crate::executor::GitCommandRunner;

/// Counters for one tree. A missing upstream leaves ahead/behind at zero;
/// a status failure zeroes everything.
pub fn sync_counters_for(runner: &impl GitCommandRunner, path: &Path) -> SyncCounters {
    let status = match runner.run(path, &["status", "--porcelain"]) {
        Ok(out) => out,
        Err(e) => {
            tracing::debug!(path = %path.display(), "git status failed: {e}");
            return SyncCounters::default();
        }
    };
    let mut counters = parse_status_porcelain(&status);

    match runner
        .run(
            path,
            &["rev-list", "--left-right", "--count", "HEAD...@{upstream}"],
        )
        .and_then(|out| parse_left_right(&out))
    {
        Ok((ahead, behind)) => {
            counters.ahead = ahead;
            counters.behind = behind;
        }
        Err(e) => tracing::trace!(path = %path.display(), "no upstream counts: {e}"),
    }
    counters
}

/// Query every path concurrently and return once all of them finished.
///
/// The map has exactly one entry per input path; paths whose task failed
/// are all-zero.
pub async fn fetch_sync_counters<R>(runner: Arc<R>, paths: Vec<String>) -> HashMap<String, SyncCounters>
where
    R: GitCommandRunner + 'static,
{
    let mut results: HashMap<String, SyncCounters> = paths
        .iter()
        .map(|p| (p.clone(), SyncCounters::default()))
        .collect();

    let mut set = JoinSet::new();
    for path in paths {
        let runner = Arc::clone(&runner);
        set.spawn_blocking(move || {
            let counters = sync_counters_for(&*runner, Path::new(&path));
            (path, counters)
        });
    }

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((path, counters)) => {
                results.insert(path, counters);
            }
            Err(e) => tracing::debug!("sync counter task failed: {e}"),
        }
    }
    results
}

fn parse_left_right(output: &str) -> Result<(u32, u32), GitError> {
    let mut parts = output.split_whitespace();
    let mut next = || {
        parts
            .next()
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| GitError::Parse(format!("rev-list --count: {:?}", output.trim())))
    };
    Ok((next()?, next()?))
}

/// Count staged, modified and untracked entries from `git status --porcelain`.
fn parse_status_porcelain(output: &str) -> SyncCounters {
    let mut counters = SyncCounters::default();
    for line in output.lines() {
        let mut chars = line.chars();
        let (Some(x), Some(y)) = (chars.next(), chars.next()) else {
            continue;
        };
        if x == '?' && y == '?' {
            counters.untracked += 1;
            continue;
        }
        if x != ' ' && x != '?' && x != '!' {
            counters.staged += 1;
        }
        if y != ' ' && y != '?' && y != '!' {
            counters.modified += 1;
        }
    }
    counters
}
