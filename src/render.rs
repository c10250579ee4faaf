//! Read-only views over the event stream state.
//!
//! Every view first resolves which workspace to show: the active workspace on the requested
//! output, or on the output of the focused workspace when no output is requested.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt::Write as _;

use niri_windows_ipc::{Window, Workspace};
use serde::Deserialize;

use crate::state::EventStreamState;

pub mod graphical;

/// Shown when no output was requested and there is no focused workspace to take it from.
pub const NO_MONITOR: &str = "couldn't determine monitor";
/// Shown when the output has no active workspace.
pub const NO_WORKSPACE: &str = "couldn't determine workspace";

const URGENT_BEGIN: &str = "<span color=\"#fb2c36\">";
const URGENT_END: &str = "</span>";

/// Symbols used by the text summary.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Symbols {
    pub unfocused: String,
    pub focused: String,
    pub unfocused_floating: String,
    pub focused_floating: String,
}

impl Default for Symbols {
    fn default() -> Self {
        Self {
            unfocused: String::from("⋅"),
            focused: String::from("⊙"),
            unfocused_floating: String::from("∗"),
            focused_floating: String::from("⊛"),
        }
    }
}

/// Why a view could not pick a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unresolved {
    /// No output was requested and none could be derived from the focused workspace.
    Output,
    /// The output has no active workspace.
    Workspace,
}

impl Unresolved {
    pub fn placeholder(self) -> &'static str {
        match self {
            Unresolved::Output => NO_MONITOR,
            Unresolved::Workspace => NO_WORKSPACE,
        }
    }
}

/// Resolves the workspace shown for `output`.
///
/// An empty `output` means the output of the focused workspace.
pub fn target_workspace<'a>(
    state: &'a EventStreamState,
    output: &str,
) -> Result<&'a Workspace, Unresolved> {
    let output = if output.is_empty() {
        state
            .focused_workspace()
            .and_then(|ws| ws.output.as_deref())
            .ok_or(Unresolved::Output)?
    } else {
        output
    };

    state
        .active_workspace_on(output)
        .ok_or(Unresolved::Workspace)
}

/// Returns the windows on the active workspace of `output`, split into tiled and floating.
///
/// Tiled windows are sorted by column, then by position in the column. Floating windows are
/// sorted left to right, then top to bottom. The windows are copies, so they stay valid after
/// the state changes.
pub fn windows_for_output(state: &EventStreamState, output: &str) -> (Vec<Window>, Vec<Window>) {
    let Ok(ws) = target_workspace(state, output) else {
        return (Vec::new(), Vec::new());
    };

    let (mut floating, mut tiled): (Vec<_>, Vec<_>) = state
        .windows_on(ws.id)
        .cloned()
        .partition(|win| win.is_floating);

    tiled.sort_by(compare_tiled);
    floating.sort_by(compare_floating);

    (tiled, floating)
}

/// Renders a one-line summary of the active workspace of `output`.
///
/// Every column from 1 to the rightmost occupied one gets a symbol, columns with an urgent window
/// are wrapped in a highlight. Floating windows follow after a space, left to right. When there
/// is nothing to show, `empty` is returned.
pub fn text_summary(
    state: &EventStreamState,
    output: &str,
    symbols: &Symbols,
    empty: &str,
) -> String {
    let ws = match target_workspace(state, output) {
        Ok(ws) => ws,
        Err(unresolved) => return unresolved.placeholder().to_owned(),
    };

    let mut focused_column = None;
    let mut max_column = 0;
    let mut urgent_columns = HashSet::new();
    let mut floating = Vec::new();

    for win in state.windows_on(ws.id) {
        if let Some(pos) = win.layout.pos_in_scrolling_layout {
            let column = pos.x;
            if win.is_focused {
                focused_column = Some(column);
            }
            max_column = max_column.max(column);
            if win.is_urgent {
                urgent_columns.insert(column);
            }
        } else if win.is_floating {
            floating.push(win);
        }
    }

    floating.sort_by(|a, b| compare_floating(a, b));

    let mut text = String::new();
    for column in 1..=max_column {
        let urgent = urgent_columns.contains(&column);
        if urgent {
            text.push_str(URGENT_BEGIN);
        }
        if focused_column == Some(column) {
            text.push_str(&symbols.focused);
        } else {
            text.push_str(&symbols.unfocused);
        }
        if urgent {
            text.push_str(URGENT_END);
        }
    }

    if !floating.is_empty() {
        if max_column > 0 {
            text.push(' ');
        }
        for win in floating {
            let symbol = if win.is_focused {
                &symbols.focused_floating
            } else {
                &symbols.unfocused_floating
            };
            text.push_str(symbol);
        }
    }

    if text.is_empty() {
        return empty.to_owned();
    }
    text
}

/// Renders a short multi-line description of the whole state, for debug logging.
pub fn describe(state: &EventStreamState) -> String {
    let mut workspaces: Vec<_> = state.workspaces.workspaces.values().collect();
    workspaces.sort_by_key(|ws| (ws.output.clone(), ws.idx));

    let mut buf = String::new();
    for ws in workspaces {
        let output = ws.output.as_deref().unwrap_or("-");
        let active = if ws.is_active { " active" } else { "" };
        let focused = if ws.is_focused { " focused" } else { "" };
        let _ = writeln!(buf, "workspace {} ({output} #{}){active}{focused}", ws.id, ws.idx);

        let mut windows: Vec<_> = state.windows_on(ws.id).collect();
        windows.sort_by(|a, b| compare_tiled(a, b));
        for win in windows {
            let app_id = win.app_id.as_deref().unwrap_or("?");
            let focused = if win.is_focused { " focused" } else { "" };
            let _ = writeln!(buf, "  window {} {app_id}{focused}", win.id);
        }
    }
    buf
}

fn compare_tiled(a: &Window, b: &Window) -> Ordering {
    let pos = |win: &Window| win.layout.pos_in_scrolling_layout.map(|pos| (pos.x, pos.y));
    pos(a).cmp(&pos(b)).then(a.id.cmp(&b.id))
}

fn compare_floating(a: &Window, b: &Window) -> Ordering {
    let pos = |win: &Window| {
        win.layout
            .tile_pos_in_workspace_view
            .map_or((0., 0.), |pos| (pos.x, pos.y))
    };
    let (ax, ay) = pos(a);
    let (bx, by) = pos(b);
    ax.total_cmp(&bx)
        .then(ay.total_cmp(&by))
        .then(a.id.cmp(&b.id))
}
