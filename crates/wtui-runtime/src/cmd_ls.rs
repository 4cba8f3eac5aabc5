//! `wtui ls`: one poll of every slice, printed once.

use std::sync::Arc;

use wtui_git::{fetch_sync_counters, list_working_trees};

use crate::cli::LsOpts;
use crate::config::Config;
use crate::poll_loop::Snapshot;
use crate::render::render_listing;
use crate::services::Services;

pub async fn cmd_ls(config: &Config, services: &Services, opts: &LsOpts) -> anyhow::Result<()> {
    let snapshot = collect_snapshot(config, services).await?;
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!(
            "{}",
            render_listing(&snapshot, config.sort, &config.root.display().to_string())
        );
    }
    Ok(())
}

async fn collect_snapshot(config: &Config, services: &Services) -> anyhow::Result<Snapshot> {
    let (git, root) = (Arc::clone(&services.git), config.root.clone());
    let trees = tokio::task::spawn_blocking(move || list_working_trees(&*git, &root)).await?;
    let paths = trees.iter().map(|t| t.path.clone()).collect();

    let reconciler = services.reconciler(config);
    let (counters, sessions) = tokio::join!(
        fetch_sync_counters(Arc::clone(&services.git), paths),
        tokio::task::spawn_blocking(move || reconciler.detect_sessions()),
    );

    Ok(Snapshot {
        trees,
        counters,
        sessions: sessions?,
        revision: 0,
    })
}
