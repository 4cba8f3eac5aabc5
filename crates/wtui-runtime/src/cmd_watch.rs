//! `wtui watch`: the live dashboard.
//!
//! Snapshots, input lines from stdin and flash ticks are turned into
//! [`Event`]s and fed through one reducer; a frame is printed whenever the
//! reducer asks for a redraw.

use std::io::Write as _;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use wtui_sessions::{FLASH_INTERVAL, FlashTracker};
use wtui_tmux::TmuxCommandRunner;

use crate::app::{Command, Dashboard, Event};
use crate::config::Config;
use crate::poll_loop::{Cadence, PollLoop};
use crate::render::render_dashboard;
use crate::services::Services;

pub async fn cmd_watch(config: &Config, services: &Services) -> anyhow::Result<()> {
    let mut running = PollLoop::new(
        Arc::clone(&services.git),
        Arc::new(services.reconciler(config)),
        config.root.clone(),
        Cadence::from_config(config),
    )
    .spawn();

    let mut dashboard = Dashboard::new(
        services.inspector(),
        services.layout(),
        config.sort,
        FlashTracker::new(config.flash_duration),
    );
    let title = config.root.display().to_string();
    draw(&dashboard, &title);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut flash = tokio::time::interval(FLASH_INTERVAL);
    flash.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let reaction = tokio::select! {
            changed = running.snapshots.changed() => {
                if changed.is_err() {
                    tracing::warn!("poll loop exited unexpectedly");
                    break;
                }
                let snapshot = Arc::clone(&*running.snapshots.borrow_and_update());
                dashboard.handle(Event::Snapshot(snapshot))
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match line.parse::<Command>() {
                    // Pane commands shell out to tmux synchronously.
                    Ok(cmd) => tokio::task::block_in_place(|| dashboard.handle(Event::Input(cmd))),
                    Err(reason) => dashboard.reject_input(reason),
                },
                Ok(None) => {
                    tracing::debug!("stdin closed, input disabled");
                    stdin_open = false;
                    continue;
                }
                Err(e) => {
                    tracing::debug!("stdin read failed: {e}");
                    stdin_open = false;
                    continue;
                }
            },
            now = flash.tick() => dashboard.handle(Event::Tick(now.into_std())),
            _ = tokio::signal::ctrl_c() => break,
        };

        for slice in reaction.repoll {
            running.repoll.request(slice);
        }
        if reaction.quit {
            break;
        }
        if reaction.redraw {
            draw(&dashboard, &title);
        }
    }

    tracing::info!("dashboard stopped");
    Ok(())
}

fn draw<R: TmuxCommandRunner>(dashboard: &Dashboard<R>, title: &str) {
    // Clear screen + cursor home
    print!("\x1b[2J\x1b[H{}", render_dashboard(dashboard, title));
    let _ = std::io::stdout().flush();
}
