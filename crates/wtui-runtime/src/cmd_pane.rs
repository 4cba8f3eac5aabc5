//! One-shot pane commands: `send`, `focus`, `move-pane`, `toggle-width`.

use anyhow::{Context as _, bail};
use wtui_tmux::{MoveDirection, WidthToggle};

use crate::affinity::{PaneAffinity, Resolution};
use crate::services::Services;

pub fn cmd_send(services: &Services, path: &str, pane: Option<u32>) -> anyhow::Result<()> {
    let path = std::path::absolute(path).with_context(|| format!("bad path {path:?}"))?;
    let path = path.to_string_lossy();
    let inspector = services.inspector();

    let index = match pane {
        Some(index) => index,
        None => match PaneAffinity::new().resolve_target(&path, &inspector) {
            Resolution::Pane(index) => index,
            unresolved => bail!("{unresolved}"),
        },
    };
    let target = inspector.send_directory_change(index, &path)?;
    println!("sent {path} to pane {} ({})", target.index, target.id);
    Ok(())
}

pub fn cmd_focus(services: &Services, pane: u32) -> anyhow::Result<()> {
    let target = services.inspector().focus_pane(pane)?;
    println!("focused pane {} ({})", target.index, target.id);
    Ok(())
}

pub fn cmd_move_pane(services: &Services, direction: MoveDirection) -> anyhow::Result<()> {
    services
        .layout()
        .move_current_pane(direction)
        .context("move-pane")?;
    Ok(())
}

/// Prints `minimized <previous width>` or `restored <width>`, so a caller
/// can keep the width and pass it back with `--stored`.
pub fn cmd_toggle_width(services: &Services, stored: Option<u16>) -> anyhow::Result<()> {
    match services.layout().toggle_width(stored)? {
        WidthToggle::Minimized { previous_width } => println!("minimized {previous_width}"),
        WidthToggle::Restored { width } => println!("restored {width}"),
    }
    Ok(())
}
