//! Follows the niri event stream and feeds it into the shared state.

use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixStream;

use anyhow::Context;
use niri_windows_ipc::stream::{parse_line, StreamError, StreamMessage};
use niri_windows_ipc::Socket;

use crate::render;
use crate::shared::SharedState;

/// Connects to the niri socket from `$NIRI_SOCKET` and requests an event stream.
pub fn connect() -> anyhow::Result<BufReader<UnixStream>> {
    let socket = Socket::connect().context("error connecting to niri")?;

    socket
        .into_event_stream()
        .context("error requesting the event stream")
}

/// Applies every event from `reader` to `shared`, in order.
///
/// Returns when niri closes the stream. Lines that fail to decode are logged and skipped; only
/// read errors end the loop early.
pub fn listen(shared: &SharedState, reader: impl BufRead) -> anyhow::Result<()> {
    for line in reader.lines() {
        let line = line.context("error reading from niri")?;
        if line.trim().is_empty() {
            continue;
        }

        match parse_line(&line) {
            Ok(StreamMessage::Event(event)) => {
                if shared.apply(event) {
                    trace!("state:\n{}", shared.with_state(render::describe));
                }
            }
            Ok(StreamMessage::Reply(Ok(response))) => {
                debug!("event stream started: {response:?}");
            }
            Ok(StreamMessage::Reply(Err(message))) => {
                error!("niri refused the event stream: {message}");
            }
            Err(StreamError::Event { name, source }) => {
                debug!("skipping {name} event: {source}");
            }
            Err(err) => {
                warn!("dropping line from niri: {err}");
                trace!("{line}");
            }
        }
    }

    info!("niri closed the event stream");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read, Write};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use niri_windows_ipc::Event;

    use super::*;
    use crate::render::Symbols;

    const STREAM: &str = r#"{"Ok":"Handled"}
{"WorkspacesChanged":{"workspaces":[{"id":1,"idx":1,"name":null,"output":"eDP-1","is_urgent":false,"is_active":true,"is_focused":true,"active_window_id":null}]}}
{"WindowsChanged":{"windows":[]}}
{"WindowOpenedOrChanged":{"window":{"id":7,"title":"vim","app_id":"kitty","pid":100,"workspace_id":1,"is_focused":true,"is_floating":false,"is_urgent":false,"layout":{"pos_in_scrolling_layout":[1,1],"tile_size":[960.0,1040.0],"window_size":[958,1038],"tile_pos_in_workspace_view":null,"window_offset_in_tile":[1.0,1.0]}}}}
{"WindowOpenedOrChanged":{"window":{"id":8,"title":null,"app_id":null,"pid":null,"workspace_id":1,"is_focused":false,"is_floating":true,"is_urgent":false,"layout":{"pos_in_scrolling_layout":null,"tile_size":[400.0,300.0],"window_size":[400,300],"tile_pos_in_workspace_view":[100.0,100.0],"window_offset_in_tile":[0.0,0.0]}}}}
"#;

    #[test]
    fn applies_events_in_order() {
        let shared = SharedState::new();
        listen(&shared, Cursor::new(STREAM)).unwrap();

        assert_eq!(shared.text_summary("", &Symbols::default(), ""), "⊙ ∗");
        shared.with_state(|state| {
            assert_eq!(state.windows.focused_id, Some(7));
            assert_eq!(state.workspaces.focused_id, Some(1));
        });
    }

    #[test]
    fn skips_bad_lines() {
        let stream = "\
{\"Ok\":\"Handled\"}
not json
[1, 2]
{}
{\"WindowClosed\":{\"id\":1},\"WindowFocusChanged\":{\"id\":null}}
{\"SomethingNew\":{\"field\":1}}

{\"OverviewOpenedOrClosed\":{\"is_open\":true}}
";
        let shared = SharedState::new();
        listen(&shared, Cursor::new(stream)).unwrap();
        shared.with_state(|state| assert!(state.overview.is_open));
    }

    #[test]
    fn refused_stream_is_not_an_error() {
        let shared = SharedState::new();
        listen(&shared, Cursor::new("{\"Err\":\"nope\"}\n")).unwrap();
        shared.with_state(|state| assert!(state.workspaces.workspaces.is_empty()));
    }

    #[test]
    fn over_a_socket() {
        let (ours, mut theirs) = UnixStream::pair().unwrap();

        let niri = thread::spawn(move || {
            let mut request = [0; 14];
            theirs.read_exact(&mut request).unwrap();
            assert_eq!(&request, b"\"EventStream\"\n");

            theirs.write_all(STREAM.as_bytes()).unwrap();
            theirs.write_all(b"{\"WindowClosed\":{\"id\":7}}\n").unwrap();
        });

        let reader = Socket::from_stream(ours).into_event_stream().unwrap();
        let shared = SharedState::new();
        let redraws = Arc::new(AtomicUsize::new(0));
        let redraws_ = redraws.clone();
        shared.on_update("count", move |shared| {
            if shared.needs_redraw() {
                redraws_.fetch_add(1, Ordering::SeqCst);
            }
        });

        listen(&shared, reader).unwrap();
        niri.join().unwrap();

        assert_eq!(redraws.load(Ordering::SeqCst), 5);
        shared.with_state(|state| {
            assert_eq!(state.windows.focused_id, None);
            assert_eq!(state.windows.windows.len(), 1);
        });
        shared.apply(Event::WindowClosed { id: 8 });
        assert_eq!(shared.text_summary("", &Symbols::default(), "-"), "-");
    }
}
