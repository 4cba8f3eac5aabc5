//! list-panes format strings and parser.

use wtui_core::Pane;

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;

/// Cheap shape: enough to match panes by working directory.
pub const LOCATION_FORMAT: &str = "#{pane_index}\t#{pane_id}\t#{pane_current_path}";

/// Full shape: adds the foreground command, shell pid and window name.
/// `window_name` is last so a name containing tabs stays intact.
pub const FULL_FORMAT: &str = "#{pane_index}\t#{pane_id}\t#{pane_current_path}\t#{pane_current_command}\t#{pane_pid}\t#{window_name}";

/// Which list-panes format to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneShape {
    Location,
    Full,
}

impl PaneShape {
    fn format(self) -> &'static str {
        match self {
            Self::Location => LOCATION_FORMAT,
            Self::Full => FULL_FORMAT,
        }
    }

    fn min_fields(self) -> usize {
        match self {
            Self::Location => 3,
            Self::Full => 6,
        }
    }
}

/// Run `tmux list-panes` for the window containing `target` (or the client's
/// current window when `None`) and parse the result.
pub fn list_panes(
    runner: &impl TmuxCommandRunner,
    shape: PaneShape,
    target: Option<&str>,
) -> Result<Vec<Pane>, TmuxError> {
    let mut args = vec!["list-panes"];
    if let Some(t) = target {
        args.extend(["-t", t]);
    }
    args.extend(["-F", shape.format()]);
    let output = runner.run(&args)?;
    parse_list_panes_output(&output, shape)
}

/// Parse raw list-panes output produced with `shape`'s format string.
pub fn parse_list_panes_output(output: &str, shape: PaneShape) -> Result<Vec<Pane>, TmuxError> {
    output
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| parse_line(line, shape, idx + 1))
        .collect()
}

fn parse_line(line: &str, shape: PaneShape, line_num: usize) -> Result<Pane, TmuxError> {
    let parts: Vec<&str> = line.splitn(shape.min_fields(), '\t').collect();
    if parts.len() < shape.min_fields() {
        return Err(TmuxError::ParseError {
            line_num,
            detail: format!(
                "expected {} tab-separated fields, got {}",
                shape.min_fields(),
                parts.len()
            ),
        });
    }

    let index = parts[0]
        .trim()
        .parse::<u32>()
        .map_err(|e| TmuxError::ParseError {
            line_num,
            detail: format!("bad pane index {:?}: {e}", parts[0]),
        })?;

    let mut pane = Pane {
        index,
        id: parts[1].to_string(),
        cwd: parts[2].to_string(),
        ..Pane::default()
    };
    if shape == PaneShape::Full {
        pane.command = parts[3].to_string();
        pane.pid = parts[4].trim().parse().ok();
        pane.window_name = parts[5].to_string();
    }
    Ok(pane)
}
