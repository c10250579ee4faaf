//! Types for following the niri event stream and sending actions to niri.
//!
//! The JSON shapes here match what niri writes to its IPC socket. Every event on the stream is a
//! JSON object with a single key naming the event, which maps directly onto the externally tagged
//! [`Event`] enum. Use [`stream::parse_line`] to turn a raw line into an [`Event`] while rejecting
//! lines that do not have exactly one populated variant.
#![warn(missing_docs)]

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

mod socket;
pub mod stream;

pub use socket::{Socket, SOCKET_PATH_ENV};

/// Request from client to niri.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Request {
    /// Request the version string for the running niri instance.
    Version,
    /// Perform an action.
    Action(Action),
    /// Start continuously receiving events from the compositor.
    ///
    /// The compositor replies with `Response::Handled`, after which it keeps writing [`Event`]s
    /// to the connection, one per line.
    EventStream,
}

/// Reply from niri to client.
///
/// Every request gets one reply.
///
/// * If an error had occurred, it will be an `Reply::Err`.
/// * If the request does not need any particular response, it will be
///   `Reply::Ok(Response::Handled)`. Kind of like an `Ok(())`.
/// * Otherwise, it will be `Reply::Ok(response)` with one of the other [`Response`] variants.
pub type Reply = Result<Response, String>;

/// Successful response from niri to client.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Response {
    /// A request that does not need a response was handled successfully.
    Handled,
    /// The version string for the running niri instance.
    Version(String),
}

/// Actions that niri can perform on behalf of the bar.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "clap", derive(clap::Parser))]
#[cfg_attr(feature = "clap", command(subcommand_value_name = "ACTION"))]
#[cfg_attr(feature = "clap", command(subcommand_help_heading = "Actions"))]
pub enum Action {
    /// Focus a window by id.
    FocusWindow {
        /// Id of the window to focus.
        #[cfg_attr(feature = "clap", arg(long))]
        id: u64,
    },
    /// Close a window.
    CloseWindow {
        /// Id of the window to close.
        ///
        /// If `None`, uses the focused window.
        #[cfg_attr(feature = "clap", arg(long))]
        id: Option<u64>,
    },
    /// Focus a column by index.
    FocusColumn {
        /// Index of the column to focus.
        ///
        /// The index starts from 1 for the first column.
        #[cfg_attr(feature = "clap", arg())]
        index: usize,
    },
    /// Focus the workspace below.
    FocusWorkspaceDown {},
    /// Focus the workspace above.
    FocusWorkspaceUp {},
    /// Focus a workspace by reference (id, index or name).
    FocusWorkspace {
        /// Reference (index or name) of the workspace to focus.
        #[cfg_attr(feature = "clap", arg())]
        reference: WorkspaceReferenceArg,
    },
    /// Switch between keyboard layouts.
    SwitchLayout {
        /// Layout to switch to.
        #[cfg_attr(feature = "clap", arg())]
        layout: LayoutSwitchTarget,
    },
    /// Toggle (open/close) the Overview.
    ToggleOverview {},
}

/// Workspace reference (id, index or name) to operate on.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceReferenceArg {
    /// Id of the workspace.
    Id(u64),
    /// Index of the workspace.
    Index(u8),
    /// Name of the workspace.
    Name(String),
}

/// Layout to switch to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutSwitchTarget {
    /// The next configured layout.
    Next,
    /// The previous configured layout.
    Prev,
}

/// Two-component vector used for positions and sizes.
///
/// Serialized as a two-element JSON array, `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Vec2<T> {
    /// First component (column, width, horizontal position).
    pub x: T,
    /// Second component (row, height, vertical position).
    pub y: T,
}

impl<T> Vec2<T> {
    /// Creates a vector from its two components.
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T> From<(T, T)> for Vec2<T> {
    fn from((x, y): (T, T)) -> Self {
        Self { x, y }
    }
}

impl<T: Serialize> Serialize for Vec2<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.x, &self.y).serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Vec2<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (x, y) = <(T, T)>::deserialize(deserializer)?;
        Ok(Self { x, y })
    }
}

/// A moment in time, from the monotonic clock.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timestamp {
    /// Number of whole seconds.
    pub secs: u64,
    /// Fractional part of the timestamp in nanoseconds (10<sup>-9</sup> seconds).
    pub nanos: u32,
}

/// Toplevel window.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Window {
    /// Unique id of this window.
    ///
    /// This id remains constant while this window is open.
    pub id: u64,
    /// Title, if set.
    pub title: Option<String>,
    /// Application ID, if set.
    pub app_id: Option<String>,
    /// Process ID that created the Wayland connection for this window, if known.
    pub pid: Option<i32>,
    /// Id of the workspace this window is on, if any.
    pub workspace_id: Option<u64>,
    /// Whether this window is currently focused.
    ///
    /// There can be either one focused window or zero (e.g. when a layer-shell surface has
    /// focus).
    pub is_focused: bool,
    /// Whether this window is currently floating.
    ///
    /// If the window isn't floating then it is in the tiling layout.
    #[serde(default)]
    pub is_floating: bool,
    /// Whether this window requests your attention.
    #[serde(default)]
    pub is_urgent: bool,
    /// Position- and size-related properties of the window.
    #[serde(default)]
    pub layout: WindowLayout,
    /// Timestamp when the window was most recently focused.
    #[serde(default)]
    pub focus_timestamp: Option<Timestamp>,
}

/// Position- and size-related properties of a [`Window`].
///
/// All sizes and positions are in logical pixels unless stated otherwise.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct WindowLayout {
    /// Location of a tiled window within a workspace: (column index, tile index in column).
    ///
    /// The indices are 1-based. `None` for floating windows.
    pub pos_in_scrolling_layout: Option<Vec2<u32>>,
    /// Size of the tile this window is in, including decorations like borders.
    pub tile_size: Vec2<f64>,
    /// Size of the window's visual geometry itself.
    pub window_size: Vec2<i32>,
    /// Tile position within the current view of the workspace.
    ///
    /// Set for floating windows.
    pub tile_pos_in_workspace_view: Option<Vec2<f64>>,
    /// Location of the window's visual geometry within its tile.
    pub window_offset_in_tile: Vec2<f64>,
}

/// A workspace.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    /// Unique id of this workspace.
    ///
    /// This id remains constant regardless of the workspace moving around and across monitors.
    pub id: u64,
    /// Index of the workspace on its monitor.
    ///
    /// This index will change as you move and re-order workspaces. Workspaces on different
    /// monitors can have the same index.
    pub idx: u8,
    /// Optional name of the workspace.
    pub name: Option<String>,
    /// Name of the output that the workspace is on.
    ///
    /// Can be `None` if no outputs are currently connected.
    pub output: Option<String>,
    /// Whether the workspace currently has an urgent window in its output.
    #[serde(default)]
    pub is_urgent: bool,
    /// Whether the workspace is currently active on its output.
    pub is_active: bool,
    /// Whether the workspace is currently focused.
    ///
    /// There's only one focused workspace across all outputs.
    pub is_focused: bool,
    /// Id of the active window on this workspace, if any.
    #[serde(default)]
    pub active_window_id: Option<u64>,
}

/// Configured keyboard layouts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct KeyboardLayouts {
    /// XKB names of the configured layouts.
    pub names: Vec<String>,
    /// Index of the currently active layout in `names`.
    pub current_idx: u8,
}

/// A compositor event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Event {
    /// The workspace configuration has changed.
    WorkspacesChanged {
        /// The new workspace configuration.
        ///
        /// This configuration completely replaces the previous configuration. I.e. if any
        /// workspaces are missing from here, then they were deleted.
        workspaces: Vec<Workspace>,
    },
    /// The workspace urgency changed.
    WorkspaceUrgencyChanged {
        /// Id of the workspace.
        id: u64,
        /// Whether this workspace has an urgent window.
        urgent: bool,
    },
    /// A workspace was activated on an output.
    ///
    /// This doesn't always mean the workspace became focused, just that it's now the active
    /// workspace on its output. All other workspaces on the same output become inactive.
    WorkspaceActivated {
        /// Id of the newly active workspace.
        id: u64,
        /// Whether this workspace also became focused.
        ///
        /// If `true`, this is now the single focused workspace. All other workspaces are no
        /// longer focused, but they may remain active on their respective outputs.
        focused: bool,
    },
    /// An active window changed on a workspace.
    WorkspaceActiveWindowChanged {
        /// Id of the workspace on which the active window changed.
        workspace_id: u64,
        /// Id of the new active window, if any.
        active_window_id: Option<u64>,
    },
    /// The window configuration has changed.
    WindowsChanged {
        /// The new window configuration.
        ///
        /// This configuration completely replaces the previous configuration. I.e. if any
        /// windows are missing from here, then they were closed.
        windows: Vec<Window>,
    },
    /// A new toplevel window was opened, or an existing toplevel window changed.
    WindowOpenedOrChanged {
        /// The new or updated window.
        ///
        /// If the window is focused, all other windows are no longer focused.
        window: Window,
    },
    /// A toplevel window was closed.
    WindowClosed {
        /// Id of the removed window.
        id: u64,
    },
    /// Window focus changed.
    ///
    /// All other windows are no longer focused.
    WindowFocusChanged {
        /// Id of the newly focused window, or `None` if no window is now focused.
        id: Option<u64>,
    },
    /// Window focus timestamp changed.
    WindowFocusTimestampChanged {
        /// Id of the window.
        id: u64,
        /// The new focus timestamp.
        focus_timestamp: Option<Timestamp>,
    },
    /// Window urgency changed.
    WindowUrgencyChanged {
        /// Id of the window.
        id: u64,
        /// The new urgency state of the window.
        urgent: bool,
    },
    /// The layout of one or more windows has changed.
    WindowLayoutsChanged {
        /// Pairs consisting of a window id and new layout information for the window.
        changes: Vec<(u64, WindowLayout)>,
    },
    /// The configured keyboard layouts have changed.
    KeyboardLayoutsChanged {
        /// The new keyboard layout configuration.
        keyboard_layouts: KeyboardLayouts,
    },
    /// The keyboard layout switched.
    KeyboardLayoutSwitched {
        /// Index of the newly active layout.
        idx: u8,
    },
    /// The overview was opened or closed.
    OverviewOpenedOrClosed {
        /// The new state of the overview.
        is_open: bool,
    },
    /// The configuration was reloaded.
    ///
    /// You will always receive this event when connecting to the event stream, indicating the
    /// last config load attempt.
    ConfigLoaded {
        /// Whether the loading failed.
        failed: bool,
    },
    /// A screenshot was captured.
    ScreenshotCaptured {
        /// The file path where the screenshot was saved, if it was written to disk.
        path: Option<String>,
    },
}

impl Event {
    /// Name of the event, as written on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Event::WorkspacesChanged { .. } => "WorkspacesChanged",
            Event::WorkspaceUrgencyChanged { .. } => "WorkspaceUrgencyChanged",
            Event::WorkspaceActivated { .. } => "WorkspaceActivated",
            Event::WorkspaceActiveWindowChanged { .. } => "WorkspaceActiveWindowChanged",
            Event::WindowsChanged { .. } => "WindowsChanged",
            Event::WindowOpenedOrChanged { .. } => "WindowOpenedOrChanged",
            Event::WindowClosed { .. } => "WindowClosed",
            Event::WindowFocusChanged { .. } => "WindowFocusChanged",
            Event::WindowFocusTimestampChanged { .. } => "WindowFocusTimestampChanged",
            Event::WindowUrgencyChanged { .. } => "WindowUrgencyChanged",
            Event::WindowLayoutsChanged { .. } => "WindowLayoutsChanged",
            Event::KeyboardLayoutsChanged { .. } => "KeyboardLayoutsChanged",
            Event::KeyboardLayoutSwitched { .. } => "KeyboardLayoutSwitched",
            Event::OverviewOpenedOrClosed { .. } => "OverviewOpenedOrClosed",
            Event::ConfigLoaded { .. } => "ConfigLoaded",
            Event::ScreenshotCaptured { .. } => "ScreenshotCaptured",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for WorkspaceReferenceArg {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let reference = if let Ok(index) = s.parse::<i32>() {
            if let Ok(idx) = u8::try_from(index) {
                Self::Index(idx)
            } else {
                return Err("workspace index must be between 0 and 255");
            }
        } else {
            Self::Name(s.to_string())
        };

        Ok(reference)
    }
}

impl std::str::FromStr for LayoutSwitchTarget {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "next" => Ok(Self::Next),
            "prev" => Ok(Self::Prev),
            _ => Err(r#"invalid layout action, can be "next" or "prev""#),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec2_is_a_json_pair() {
        let v: Vec2<f64> = serde_json::from_str("[1.5, 2]").unwrap();
        assert_eq!(v, Vec2::new(1.5, 2.));
        assert_eq!(serde_json::to_string(&Vec2::new(3u32, 4u32)).unwrap(), "[3,4]");

        assert!(serde_json::from_str::<Vec2<u32>>("[1]").is_err());
        assert!(serde_json::from_str::<Vec2<u32>>("[1, 2, 3]").is_err());
    }

    #[test]
    fn event_stream_request_is_a_bare_string() {
        let json = serde_json::to_string(&Request::EventStream).unwrap();
        assert_eq!(json, r#""EventStream""#);
    }

    #[test]
    fn actions_are_wrapped() {
        let json = serde_json::to_string(&Request::Action(Action::FocusWindow { id: 7 })).unwrap();
        assert_eq!(json, r#"{"Action":{"FocusWindow":{"id":7}}}"#);

        let json = serde_json::to_string(&Request::Action(Action::ToggleOverview {})).unwrap();
        assert_eq!(json, r#"{"Action":{"ToggleOverview":{}}}"#);
    }

    #[test]
    fn window_with_full_layout() {
        let json = r#"{
            "id": 12,
            "title": "~/src",
            "app_id": "Alacritty",
            "pid": 4242,
            "workspace_id": 3,
            "is_focused": true,
            "is_floating": false,
            "is_urgent": false,
            "layout": {
                "pos_in_scrolling_layout": [2, 1],
                "tile_size": [960.0, 1040.0],
                "window_size": [956, 1036],
                "tile_pos_in_workspace_view": null,
                "window_offset_in_tile": [2.0, 2.0]
            },
            "focus_timestamp": {"secs": 1200, "nanos": 5}
        }"#;
        let window: Window = serde_json::from_str(json).unwrap();
        assert_eq!(window.id, 12);
        assert_eq!(window.workspace_id, Some(3));
        assert_eq!(window.layout.pos_in_scrolling_layout, Some(Vec2::new(2, 1)));
        assert_eq!(window.layout.tile_size, Vec2::new(960., 1040.));
        assert_eq!(window.layout.tile_pos_in_workspace_view, None);
        assert_eq!(
            window.focus_timestamp,
            Some(Timestamp {
                secs: 1200,
                nanos: 5
            })
        );
    }

    #[test]
    fn window_without_optional_fields() {
        let json = r#"{
            "id": 1,
            "title": null,
            "app_id": null,
            "pid": null,
            "workspace_id": null,
            "is_focused": false
        }"#;
        let window: Window = serde_json::from_str(json).unwrap();
        assert!(!window.is_floating);
        assert!(!window.is_urgent);
        assert_eq!(window.layout, WindowLayout::default());
        assert_eq!(window.focus_timestamp, None);
    }

    #[test]
    fn layout_changes_are_pairs() {
        let json = r#"{"WindowLayoutsChanged":{"changes":[[5,{
            "pos_in_scrolling_layout": null,
            "tile_size": [300.0, 200.0],
            "window_size": [300, 200],
            "tile_pos_in_workspace_view": [40.0, 60.0],
            "window_offset_in_tile": [0.0, 0.0]
        }]]}}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        let Event::WindowLayoutsChanged { changes } = event else {
            panic!("wrong event: {event:?}");
        };
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].0, 5);
        assert_eq!(
            changes[0].1.tile_pos_in_workspace_view,
            Some(Vec2::new(40., 60.))
        );
    }

    #[test]
    fn parse_workspace_reference() {
        assert_eq!(
            "3".parse::<WorkspaceReferenceArg>(),
            Ok(WorkspaceReferenceArg::Index(3))
        );
        assert_eq!(
            "chat".parse::<WorkspaceReferenceArg>(),
            Ok(WorkspaceReferenceArg::Name(String::from("chat")))
        );
        assert!("300".parse::<WorkspaceReferenceArg>().is_err());
    }
}
