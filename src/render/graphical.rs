//! Layout of the graphical indicator: one box per column, one tile per window.
//!
//! Sizes are in bar pixels. Tiles in a column are separated by 1px gaps, and no tile is shorter
//! than 1px. When a column has more windows than the bar has room for, the bottom windows are
//! left out.

use niri_windows_ipc::{Action, Window};

use crate::config::{RegexEq, WindowRule};

/// Fraction of the screen height that a single full-height window is drawn at.
const SCREEN_HEIGHT_SCALE: f64 = 0.95;

/// Vertical gap between tiles in a column.
const GAP: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTiles {
    /// 1-based column index in the scrolling layout.
    pub column: u32,
    pub width: i32,
    pub is_focused: bool,
    pub classes: Vec<String>,
    /// Tiles from top to bottom.
    pub tiles: Vec<Tile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub window_id: u64,
    pub height: i32,
    pub is_focused: bool,
    pub is_urgent: bool,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MouseButton {
    Primary,
    Middle,
    Secondary,
}

/// Lays out tiled windows as columns of tiles.
///
/// `tiled` must be sorted by column, then by position in the column, as returned by
/// [`windows_for_output`](super::windows_for_output).
pub fn column_tiles(
    tiled: &[Window],
    bar_height: i32,
    screen_height: i32,
    rules: &[WindowRule],
) -> Vec<ColumnTiles> {
    if bar_height <= 0 || screen_height <= 0 {
        debug!("cannot lay out tiles in a {bar_height}px bar on a {screen_height}px screen");
        return Vec::new();
    }
    let scale = f64::from(bar_height) / f64::from(screen_height);

    let mut columns = Vec::new();
    for column in tiled.chunk_by(|a, b| column_of(a) == column_of(b)) {
        let Some(column_idx) = column_of(&column[0]) else {
            continue;
        };

        let sizes: Vec<f64> = column.iter().map(|win| win.layout.tile_size.y).collect();
        let heights = tile_heights(&sizes, bar_height, screen_height);

        let tiles: Vec<Tile> = column
            .iter()
            .zip(heights)
            .map(|(win, height)| {
                let mut classes = vec![String::from("tile")];
                if win.is_focused {
                    classes.push(String::from("focused"));
                }
                classes.extend(classes_for(win, rules));

                Tile {
                    window_id: win.id,
                    height,
                    is_focused: win.is_focused,
                    is_urgent: win.is_urgent,
                    classes,
                }
            })
            .collect();

        let is_focused = column.iter().any(|win| win.is_focused);
        let mut classes = vec![String::from("column")];
        if is_focused {
            classes.push(String::from("focused"));
        }

        columns.push(ColumnTiles {
            column: column_idx,
            // Truncated to never overflow the bar.
            width: (column[0].layout.tile_size.x * scale) as i32,
            is_focused,
            classes,
            tiles,
        });
    }

    columns
}

fn column_of(win: &Window) -> Option<u32> {
    win.layout.pos_in_scrolling_layout.map(|pos| pos.x)
}

/// Splits the bar height between tiles proportionally to their heights on screen.
///
/// Returns one height per tile that fits, top to bottom. A lone tile keeps its proportion of the
/// screen; several tiles fill the bar exactly, gaps included.
pub fn tile_heights(tile_heights: &[f64], bar_height: i32, screen_height: i32) -> Vec<i32> {
    if bar_height <= 0 {
        return Vec::new();
    }

    match tile_heights {
        [] => Vec::new(),
        [single] => {
            let screen = f64::from(screen_height) * SCREEN_HEIGHT_SCALE;
            let height = (single / screen * f64::from(bar_height)).round() as i32;
            vec![height.min(bar_height)]
        }
        _ => split_column(tile_heights, bar_height),
    }
}

fn split_column(tile_heights: &[f64], bar_height: i32) -> Vec<i32> {
    let count = tile_heights.len() as i32;
    let available = bar_height - GAP * (count - 1);

    let total: f64 = tile_heights.iter().sum();
    let share = |height: f64| {
        if total > 0. {
            height / total
        } else {
            1. / f64::from(count)
        }
    };

    let mut heights: Vec<i32> = tile_heights
        .iter()
        .map(|&height| ((f64::from(available) * share(height)).round() as i32).max(1))
        .collect();
    let mut leftover = available - heights.iter().sum::<i32>();

    while leftover < 0 {
        let mut shrunk = false;
        for height in &mut heights {
            if leftover == 0 {
                break;
            }
            if *height > 1 {
                *height -= 1;
                leftover += 1;
                shrunk = true;
            }
        }

        // Every tile is at its minimum, so the bottom one has to go.
        if !shrunk {
            let Some(removed) = heights.pop() else {
                break;
            };
            leftover += removed;
            if !heights.is_empty() {
                leftover += GAP;
            }
        }
    }

    if leftover > 0 && !heights.is_empty() {
        let len = heights.len();
        for i in 0..leftover as usize {
            heights[i % len] += 1;
        }
    }

    heights
}

/// Returns the classes of all window rules that apply to `window`.
///
/// Rules are checked in order, and the first matching rule stops the search unless it has
/// `continue` set.
pub fn classes_for(window: &Window, rules: &[WindowRule]) -> Vec<String> {
    let mut classes = Vec::new();
    for rule in rules {
        if !rule_matches(rule, window) {
            continue;
        }

        if !rule.class.is_empty() {
            classes.push(rule.class.clone());
        }
        if !rule.r#continue {
            break;
        }
    }
    classes
}

fn rule_matches(rule: &WindowRule, window: &Window) -> bool {
    let matches = |regex: &Option<RegexEq>, value: &Option<String>| match regex {
        None => true,
        Some(regex) => value.as_deref().is_some_and(|value| regex.0.is_match(value)),
    };

    matches(&rule.app_id, &window.app_id) && matches(&rule.title, &window.title)
}

/// Returns the action for a click on the tile of `window_id`.
pub fn click_action(button: MouseButton, window_id: u64) -> Option<Action> {
    match button {
        MouseButton::Primary => Some(Action::FocusWindow { id: window_id }),
        MouseButton::Middle => Some(Action::ToggleOverview {}),
        MouseButton::Secondary => None,
    }
}
