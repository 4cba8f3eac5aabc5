//! wtui: git worktree dashboard for tmux.
//!
//! Lists the working trees of one repository together with the tmux panes
//! and assistant sessions living in them, and drives those panes.

use clap::Parser;

mod affinity;
mod app;
mod cli;
mod cmd_ls;
mod cmd_pane;
mod cmd_watch;
mod cmd_worktree;
mod config;
mod poll_loop;
mod render;
mod services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    init_tracing();

    let config = config::Config::from_cli(&args)?;
    let command = args.command.unwrap_or(cli::Command::Watch);
    if command.needs_tmux() {
        services::require_tmux()?;
    }
    let services = services::Services::from_config(&config);

    match command {
        cli::Command::Watch => cmd_watch::cmd_watch(&config, &services).await?,
        cli::Command::Ls(opts) => cmd_ls::cmd_ls(&config, &services, &opts).await?,
        cli::Command::Send(opts) => cmd_pane::cmd_send(&services, &opts.path, opts.pane)?,
        cli::Command::Focus { pane } => cmd_pane::cmd_focus(&services, pane)?,
        cli::Command::MovePane { direction } => cmd_pane::cmd_move_pane(&services, direction)?,
        cli::Command::ToggleWidth { stored } => cmd_pane::cmd_toggle_width(&services, stored)?,
        cli::Command::Add { name, branch } => {
            cmd_worktree::cmd_add(&config, &services, &name, branch.as_deref())?;
        }
        cli::Command::Remove { name, force } => {
            cmd_worktree::cmd_remove(&config, &services, &name, force)?;
        }
    }

    Ok(())
}

/// `WTUI_LOG`, then `RUST_LOG`, then `warn`. Logs go to stderr so they never
/// interleave with frames on stdout.
fn init_tracing() {
    let filter = std::env::var("WTUI_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}
