//! Event stream state shared between one writer and any number of readers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};

use niri_windows_ipc::{Event, Window};

use crate::config::{Config, WindowRule};
use crate::render::graphical::{self, ColumnTiles};
use crate::render::{self, Symbols};
use crate::state::{EventStreamState, EventStreamStatePart as _};

/// Called after every applied event.
pub type Subscriber = Arc<dyn Fn(&SharedState) + Send + Sync>;

/// [`EventStreamState`] behind a reader/writer lock, with change notifications.
///
/// Construct one per process and hand out `Arc<SharedState>` to every consumer. Events go in
/// through [`apply`](Self::apply) from a single listener thread; the views take the read lock
/// and return owned data.
#[derive(Default)]
pub struct SharedState {
    state: RwLock<EventStreamState>,
    subscribers: Mutex<HashMap<String, Subscriber>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event, then calls every subscriber.
    ///
    /// The write lock is released before the subscribers run, so they can read the updated
    /// state. Subscribers must not call `apply` themselves. Returns whether the event changed
    /// anything visible.
    pub fn apply(&self, event: Event) -> bool {
        let needs_redraw = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            state.apply(event);
            state.needs_redraw()
        };

        let subscribers: Vec<Subscriber> = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for subscriber in subscribers {
            subscriber(self);
        }

        needs_redraw
    }

    /// Registers `callback` under `id`, replacing any earlier callback with the same id.
    pub fn on_update(
        &self,
        id: impl Into<String>,
        callback: impl Fn(&SharedState) + Send + Sync + 'static,
    ) {
        let id = id.into();
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        if subscribers.insert(id.clone(), Arc::new(callback)).is_some() {
            trace!("replaced subscriber {id}");
        }
    }

    /// Removes the callback registered under `id`, if any.
    pub fn remove_on_update(&self, id: &str) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        if subscribers.remove(id).is_none() {
            debug!("no subscriber {id} to remove");
        }
    }

    /// Whether the last applied event changed anything visible.
    pub fn needs_redraw(&self) -> bool {
        self.read().needs_redraw()
    }

    /// Runs `f` with the state read-locked.
    pub fn with_state<R>(&self, f: impl FnOnce(&EventStreamState) -> R) -> R {
        f(&self.read())
    }

    /// Returns the events that rebuild the current state from scratch.
    pub fn replicate(&self) -> Vec<Event> {
        self.read().replicate()
    }

    pub fn windows_for_output(&self, output: &str) -> (Vec<Window>, Vec<Window>) {
        render::windows_for_output(&self.read(), output)
    }

    pub fn text_summary(&self, output: &str, symbols: &Symbols, empty: &str) -> String {
        render::text_summary(&self.read(), output, symbols, empty)
    }

    /// Text for the bar on the configured output.
    ///
    /// Shows the `empty` placeholder until niri has sent its workspaces.
    pub fn bar_text(&self, config: &Config) -> String {
        let state = self.read();
        if state.workspaces.workspaces.is_empty() {
            return config.empty.clone();
        }

        let output = config.output.as_deref().unwrap_or("");
        render::text_summary(&state, output, &config.symbols, &config.empty)
    }

    pub fn column_tiles(
        &self,
        output: &str,
        bar_height: i32,
        screen_height: i32,
        rules: &[WindowRule],
    ) -> Vec<ColumnTiles> {
        let (tiled, _) = self.windows_for_output(output);
        graphical::column_tiles(&tiled, bar_height, screen_height, rules)
    }

    fn read(&self) -> RwLockReadGuard<'_, EventStreamState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}
