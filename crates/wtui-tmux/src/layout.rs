//! Moves and resizes the dashboard's own pane.
//!
//! Neither operation is atomic: each is a short sequence of tmux commands and
//! a failure midway is reported as-is without undoing earlier steps.

use crate::error::{LayoutError, TmuxError};
use crate::executor::TmuxCommandRunner;

/// Width the pane collapses to when minimized.
pub const MIN_PANE_WIDTH: u16 = 5;

/// Widths up to this many columns above the minimum count as minimized.
const MIN_WIDTH_SLACK: u16 = 2;

const GEOMETRY_FORMAT: &str = "#{pane_id}\t#{pane_width}\t#{window_id}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Left,
    Right,
}

impl std::str::FromStr for MoveDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" | "l" => Ok(Self::Left),
            "right" | "r" => Ok(Self::Right),
            other => Err(format!("unknown direction {other:?} (expected left|right)")),
        }
    }
}

/// Outcome of [`PaneLayoutController::toggle_width`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidthToggle {
    /// Resized back to the stored width.
    Restored { width: u16 },
    /// Collapsed to [`MIN_PANE_WIDTH`]; the caller keeps `previous_width`
    /// and passes it to the next toggle.
    Minimized { previous_width: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Geometry {
    pane_id: String,
    width: u16,
    window_id: String,
}

pub struct PaneLayoutController<R> {
    runner: R,
    self_pane: Option<String>,
}

impl<R: TmuxCommandRunner> PaneLayoutController<R> {
    pub fn new(runner: R, self_pane: Option<String>) -> Self {
        Self { runner, self_pane }
    }

    /// Detach the pane into its own window, rejoin it at the left or right
    /// edge of its original window spanning the full height, then restore
    /// its width.
    pub fn move_current_pane(&self, direction: MoveDirection) -> Result<(), LayoutError> {
        let geo = self.geometry()?;
        let width = geo.width.to_string();

        self.step("break-pane", &["break-pane", "-d", "-s", &geo.pane_id])?;

        let mut join = vec!["join-pane", "-h", "-f"];
        if direction == MoveDirection::Left {
            join.push("-b");
        }
        join.extend(["-s", geo.pane_id.as_str(), "-t", geo.window_id.as_str()]);
        self.step("join-pane", &join)?;

        self.step(
            "resize-pane",
            &["resize-pane", "-t", &geo.pane_id, "-x", &width],
        )?;
        tracing::debug!(pane = %geo.pane_id, ?direction, width = geo.width, "moved pane");
        Ok(())
    }

    /// Two-state width toggle keyed on the measured width.
    ///
    /// At (or near) the minimum with a stored width: restore it. Otherwise
    /// minimize and report the width that was replaced.
    pub fn toggle_width(&self, stored_width: Option<u16>) -> Result<WidthToggle, LayoutError> {
        let geo = self.geometry()?;
        let near_min = geo.width <= MIN_PANE_WIDTH + MIN_WIDTH_SLACK;

        match stored_width {
            Some(width) if near_min => {
                self.resize(&geo.pane_id, width)?;
                Ok(WidthToggle::Restored { width })
            }
            _ => {
                self.resize(&geo.pane_id, MIN_PANE_WIDTH)?;
                Ok(WidthToggle::Minimized {
                    previous_width: geo.width,
                })
            }
        }
    }

    fn resize(&self, pane_id: &str, width: u16) -> Result<(), TmuxError> {
        let width = width.to_string();
        self.runner
            .run(&["resize-pane", "-t", pane_id, "-x", &width])
            .map(drop)
    }

    fn step(&self, step: &'static str, args: &[&str]) -> Result<(), LayoutError> {
        self.runner
            .run(args)
            .map(drop)
            .map_err(|source| LayoutError::MoveStep { step, source })
    }

    fn geometry(&self) -> Result<Geometry, LayoutError> {
        let mut args = vec!["display-message", "-p"];
        if let Some(ref id) = self.self_pane {
            args.extend(["-t", id.as_str()]);
        }
        args.push(GEOMETRY_FORMAT);
        let out = self.runner.run(&args)?;
        parse_geometry(out.trim())
    }
}

fn parse_geometry(line: &str) -> Result<Geometry, LayoutError> {
    let mut parts = line.split('\t');
    let (Some(pane_id), Some(width), Some(window_id)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(LayoutError::BadGeometry(line.to_string()));
    };
    if pane_id.is_empty() {
        return Err(LayoutError::NoCurrentPane);
    }
    let width = width
        .parse()
        .map_err(|_| LayoutError::BadGeometry(line.to_string()))?;
    Ok(Geometry {
        pane_id: pane_id.to_string(),
        width,
        window_id: window_id.to_string(),
    })
}
