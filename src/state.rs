//! Event-sourced model of the compositor's windows and workspaces.
//!
//! 1. Create an [`EventStreamState`] using `Default::default()`, or any individual state part if
//!    you only care about part of the state.
//! 2. Connect to the niri socket and request an event stream.
//! 3. Pass every [`Event`] to [`EventStreamStatePart::apply`] on your state.
//! 4. Read the fields of the state as needed.
//!
//! Unlike a plain mirror of the stream, the parts here keep the focus and activation flags
//! consistent on their own: after every event there is at most one focused window, at most one
//! focused workspace, and at most one active workspace per output, whatever the producer sent.
//! Events that refer to ids the state has not seen are logged and skipped.

use std::collections::HashMap;

use niri_windows_ipc::{Event, KeyboardLayouts, Window, Workspace};


/// Outcome of passing an event to [`EventStreamStatePart::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// The event changed something that shows up in the rendered views.
    Redraw,
    /// The event was handled, but nothing visible changed.
    Quiet,
    /// The event is not handled by this part of the state.
    Ignored(Event),
}

/// Part of the state communicated via the event stream.
pub trait EventStreamStatePart {
    /// Returns a sequence of events that replicates this state from default initialization.
    fn replicate(&self) -> Vec<Event>;

    /// Applies the event to this state.
    ///
    /// Never fails: events referring to unknown windows or workspaces are logged and leave the
    /// state untouched.
    fn apply(&mut self, event: Event) -> Applied;
}

/// The full state communicated over the event stream.
///
/// Different parts of the state are not guaranteed to be consistent across every single event
/// sent by niri. For example, you may receive [`Event::WindowFocusChanged`] for a just-opened
/// window *before* the [`Event::WindowOpenedOrChanged`] for that window. Between these two events,
/// [`WindowsState::focused_id`] refers to a window that does not yet exist in the map.
#[derive(Debug, Default)]
pub struct EventStreamState {
    /// State of workspaces.
    pub workspaces: WorkspacesState,

    /// State of windows.
    pub windows: WindowsState,

    /// State of the keyboard layouts.
    pub keyboard_layouts: KeyboardLayoutsState,

    /// State of the overview.
    pub overview: OverviewState,

    /// State of the config.
    pub config: ConfigState,

    /// Whether the last applied event changed anything visible.
    needs_redraw: bool,
}

/// The workspaces state communicated over the event stream.
#[derive(Debug, Default)]
pub struct WorkspacesState {
    /// Map from a workspace id to the workspace.
    pub workspaces: HashMap<u64, Workspace>,

    /// Id of the focused workspace.
    pub focused_id: Option<u64>,
}

/// The windows state communicated over the event stream.
#[derive(Debug, Default)]
pub struct WindowsState {
    /// Map from a window id to the window.
    pub windows: HashMap<u64, Window>,

    /// Id of the focused window.
    ///
    /// May refer to a window that is not in the map yet when focus moved to a window before it
    /// was announced. That window gets marked focused when it arrives.
    pub focused_id: Option<u64>,
}

/// The keyboard layout state communicated over the event stream.
#[derive(Debug, Default)]
pub struct KeyboardLayoutsState {
    /// Configured keyboard layouts.
    pub keyboard_layouts: Option<KeyboardLayouts>,
}

/// The overview state communicated over the event stream.
#[derive(Debug, Default)]
pub struct OverviewState {
    /// Whether the overview is currently open.
    pub is_open: bool,
}

/// The config state communicated over the event stream.
#[derive(Debug, Default)]
pub struct ConfigState {
    /// Whether the last config load attempt had failed.
    pub failed: bool,
}

impl EventStreamState {
    /// Whether the last applied event changed anything visible.
    ///
    /// Reset at the start of every [`apply`](EventStreamStatePart::apply).
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Returns the focused workspace, if known.
    pub fn focused_workspace(&self) -> Option<&Workspace> {
        let id = self.workspaces.focused_id?;
        self.workspaces.workspaces.get(&id)
    }

    /// Returns the focused window, if known.
    pub fn focused_window(&self) -> Option<&Window> {
        let id = self.windows.focused_id?;
        self.windows.windows.get(&id)
    }

    /// Returns the active workspace on the given output.
    pub fn active_workspace_on(&self, output: &str) -> Option<&Workspace> {
        self.workspaces
            .workspaces
            .values()
            .find(|ws| ws.is_active && ws.output.as_deref() == Some(output))
    }

    /// Returns an iterator over the windows on the given workspace.
    pub fn windows_on(&self, workspace_id: u64) -> impl Iterator<Item = &Window> + '_ {
        self.windows
            .windows
            .values()
            .filter(move |win| win.workspace_id == Some(workspace_id))
    }

    #[cfg(test)]
    pub fn verify_invariants(&self) {
        self.workspaces.verify_invariants();
        self.windows.verify_invariants();
    }
}

impl EventStreamStatePart for EventStreamState {
    fn replicate(&self) -> Vec<Event> {
        let mut events = Vec::new();
        events.extend(self.workspaces.replicate());
        events.extend(self.windows.replicate());
        events.extend(self.keyboard_layouts.replicate());
        events.extend(self.overview.replicate());
        events.extend(self.config.replicate());
        events
    }

    fn apply(&mut self, event: Event) -> Applied {
        self.needs_redraw = false;
        trace!("applying {event}");

        let parts: [&mut dyn EventStreamStatePart; 5] = [
            &mut self.workspaces,
            &mut self.windows,
            &mut self.keyboard_layouts,
            &mut self.overview,
            &mut self.config,
        ];

        let mut applied = Applied::Ignored(event);
        for part in parts {
            let Applied::Ignored(event) = applied else {
                break;
            };
            applied = part.apply(event);
        }

        match &applied {
            Applied::Redraw => self.needs_redraw = true,
            Applied::Quiet => (),
            Applied::Ignored(Event::ScreenshotCaptured { path }) => {
                debug!("screenshot captured: {path:?}");
            }
            Applied::Ignored(event) => debug!("ignoring {event} event"),
        }

        applied
    }
}

impl EventStreamStatePart for WorkspacesState {
    fn replicate(&self) -> Vec<Event> {
        let workspaces = self.workspaces.values().cloned().collect();
        vec![Event::WorkspacesChanged { workspaces }]
    }

    fn apply(&mut self, event: Event) -> Applied {
        match event {
            Event::WorkspacesChanged { workspaces } => {
                let mut focused = None;
                let mut active_on = HashMap::new();

                self.workspaces = HashMap::with_capacity(workspaces.len());
                for ws in workspaces {
                    if ws.is_focused {
                        if let Some(prev) = focused.replace(ws.id) {
                            warn!("workspaces {prev} and {} are both focused", ws.id);
                        }
                    }
                    if let (true, Some(output)) = (ws.is_active, &ws.output) {
                        if let Some(prev) = active_on.insert(output.clone(), ws.id) {
                            warn!("workspaces {prev} and {} are both active on {output}", ws.id);
                        }
                    }
                    self.workspaces.insert(ws.id, ws);
                }

                // Last one in list order wins.
                for ws in self.workspaces.values_mut() {
                    ws.is_focused = focused == Some(ws.id);
                    if let Some(output) = &ws.output {
                        ws.is_active = active_on.get(output) == Some(&ws.id);
                    }
                }

                if focused != self.focused_id {
                    debug!("focused workspace changed to {focused:?}");
                }
                self.focused_id = focused;
            }
            Event::WorkspaceUrgencyChanged { id, urgent } => {
                let Some(ws) = self.workspaces.get_mut(&id) else {
                    warn!("urgency changed on unknown workspace {id}");
                    return Applied::Quiet;
                };
                ws.is_urgent = urgent;
            }
            Event::WorkspaceActivated { id, focused } => {
                let Some(ws) = self.workspaces.get(&id) else {
                    error!("activated workspace {id} was missing from the map");
                    return Applied::Quiet;
                };
                let Some(output) = ws.output.clone() else {
                    error!("activated workspace {id} has no output");
                    return Applied::Quiet;
                };

                for ws in self.workspaces.values_mut() {
                    let got_activated = ws.id == id;
                    if ws.output.as_ref() == Some(&output) {
                        ws.is_active = got_activated;
                    }

                    if focused {
                        ws.is_focused = got_activated;
                    }
                }

                if focused {
                    self.focused_id = Some(id);
                }
            }
            Event::WorkspaceActiveWindowChanged {
                workspace_id,
                active_window_id,
            } => {
                let Some(ws) = self.workspaces.get_mut(&workspace_id) else {
                    warn!("active window changed on unknown workspace {workspace_id}");
                    return Applied::Quiet;
                };
                ws.active_window_id = active_window_id;
                return Applied::Quiet;
            }
            event => return Applied::Ignored(event),
        }
        Applied::Redraw
    }
}

impl WorkspacesState {
    #[cfg(test)]
    fn verify_invariants(&self) {
        use std::collections::HashSet;

        for (id, ws) in &self.workspaces {
            assert_eq!(*id, ws.id, "workspace must be keyed by its id");
        }

        let focused: Vec<_> = self.workspaces.values().filter(|ws| ws.is_focused).collect();
        assert!(focused.len() <= 1, "at most one workspace can be focused");
        assert_eq!(
            focused.first().map(|ws| ws.id),
            self.focused_id,
            "focused workspace id must match the focused flag",
        );

        let mut outputs = HashSet::new();
        for ws in self.workspaces.values() {
            if let (true, Some(output)) = (ws.is_active, &ws.output) {
                assert!(
                    outputs.insert(output),
                    "at most one workspace can be active on output {output}",
                );
            }
        }
    }
}

impl EventStreamStatePart for WindowsState {
    fn replicate(&self) -> Vec<Event> {
        let windows = self.windows.values().cloned().collect();
        let mut events = vec![Event::WindowsChanged { windows }];

        // Focus that arrived ahead of its window.
        if let Some(id) = self.focused_id {
            if !self.windows.contains_key(&id) {
                events.push(Event::WindowFocusChanged { id: Some(id) });
            }
        }

        events
    }

    fn apply(&mut self, event: Event) -> Applied {
        match event {
            Event::WindowsChanged { windows } => {
                let pending = self.focused_id.filter(|id| !self.windows.contains_key(id));
                let mut focused = None;

                self.windows = HashMap::with_capacity(windows.len());
                for win in windows {
                    if win.is_focused {
                        if let Some(prev) = focused.replace(win.id) {
                            warn!("windows {prev} and {} are both focused", win.id);
                        }
                    }
                    self.windows.insert(win.id, win);
                }

                if let Some(id) = pending {
                    if focused.is_none() && self.windows.contains_key(&id) {
                        debug!("window {id} got focus before it was opened");
                        focused = Some(id);
                    }
                }

                // Last one in list order wins.
                for win in self.windows.values_mut() {
                    win.is_focused = focused == Some(win.id);
                }
                self.focused_id = focused;
            }
            Event::WindowOpenedOrChanged { mut window } => {
                let id = window.id;

                if !window.is_focused && self.focused_id == Some(id) {
                    if self.windows.contains_key(&id) {
                        self.focused_id = None;
                    } else {
                        debug!("window {id} got focus before it was opened");
                        window.is_focused = true;
                    }
                }

                if window.is_focused {
                    for win in self.windows.values_mut() {
                        win.is_focused = false;
                    }
                    self.focused_id = Some(id);
                }

                self.windows.insert(id, window);
            }
            Event::WindowClosed { id } => {
                if self.focused_id == Some(id) {
                    self.focused_id = None;
                }

                if self.windows.remove(&id).is_none() {
                    warn!("closed window {id} was missing from the map");
                    return Applied::Quiet;
                }
            }
            Event::WindowFocusChanged { id } => {
                for win in self.windows.values_mut() {
                    win.is_focused = Some(win.id) == id;
                }

                if let Some(id) = id {
                    if !self.windows.contains_key(&id) {
                        warn!("focused window {id} is not known yet");
                    }
                }
                self.focused_id = id;
            }
            Event::WindowFocusTimestampChanged {
                id,
                focus_timestamp,
            } => {
                let Some(win) = self.windows.get_mut(&id) else {
                    debug!("focus timestamp changed on unknown window {id}");
                    return Applied::Quiet;
                };
                win.focus_timestamp = focus_timestamp;
                return Applied::Quiet;
            }
            Event::WindowUrgencyChanged { id, urgent } => {
                let Some(win) = self.windows.get_mut(&id) else {
                    warn!("urgency changed on unknown window {id}");
                    return Applied::Quiet;
                };
                win.is_urgent = urgent;
            }
            Event::WindowLayoutsChanged { changes } => {
                let mut changed = false;
                for (id, update) in changes {
                    let Some(win) = self.windows.get_mut(&id) else {
                        warn!("layout changed on unknown window {id}");
                        continue;
                    };
                    win.layout = update;
                    changed = true;
                }

                if !changed {
                    return Applied::Quiet;
                }
            }
            event => return Applied::Ignored(event),
        }
        Applied::Redraw
    }
}

impl WindowsState {
    #[cfg(test)]
    fn verify_invariants(&self) {
        for (id, win) in &self.windows {
            assert_eq!(*id, win.id, "window must be keyed by its id");
        }

        let focused: Vec<_> = self.windows.values().filter(|win| win.is_focused).collect();
        assert!(focused.len() <= 1, "at most one window can be focused");

        if let Some(win) = focused.first() {
            assert_eq!(
                self.focused_id,
                Some(win.id),
                "focused window id must match the focused flag",
            );
        }

        if let Some(id) = self.focused_id {
            if let Some(win) = self.windows.get(&id) {
                assert!(win.is_focused, "window {id} is the focused one but not flagged");
            }
        }
    }
}

impl EventStreamStatePart for KeyboardLayoutsState {
    fn replicate(&self) -> Vec<Event> {
        if let Some(keyboard_layouts) = self.keyboard_layouts.clone() {
            vec![Event::KeyboardLayoutsChanged { keyboard_layouts }]
        } else {
            vec![]
        }
    }

    fn apply(&mut self, event: Event) -> Applied {
        match event {
            Event::KeyboardLayoutsChanged { keyboard_layouts } => {
                self.keyboard_layouts = Some(keyboard_layouts);
            }
            Event::KeyboardLayoutSwitched { idx } => {
                let Some(kb) = self.keyboard_layouts.as_mut() else {
                    warn!("keyboard layout switched before layouts were set");
                    return Applied::Quiet;
                };
                kb.current_idx = idx;
            }
            event => return Applied::Ignored(event),
        }
        Applied::Quiet
    }
}

impl EventStreamStatePart for OverviewState {
    fn replicate(&self) -> Vec<Event> {
        vec![Event::OverviewOpenedOrClosed {
            is_open: self.is_open,
        }]
    }

    fn apply(&mut self, event: Event) -> Applied {
        match event {
            Event::OverviewOpenedOrClosed { is_open } => {
                self.is_open = is_open;
            }
            event => return Applied::Ignored(event),
        }
        Applied::Quiet
    }
}

impl EventStreamStatePart for ConfigState {
    fn replicate(&self) -> Vec<Event> {
        vec![Event::ConfigLoaded {
            failed: self.failed,
        }]
    }

    fn apply(&mut self, event: Event) -> Applied {
        match event {
            Event::ConfigLoaded { failed } => {
                if failed {
                    warn!("niri failed to load its config");
                }
                self.failed = failed;
            }
            event => return Applied::Ignored(event),
        }
        Applied::Quiet
    }
}
