use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{bail, Context};
use niri_windows_ipc::{Action, Request, Response, Socket};
use serde::Serialize;
use serde_json::json;

use crate::cli::Msg;

/// Sends actions to niri while the event stream runs on another connection.
///
/// niri answers one request per connection, so every action opens its own connection. Writes
/// do not wait for niri to answer: each reply is read and logged on a background thread, which
/// exits when niri closes that connection.
pub struct ActionSocket {
    path: PathBuf,
}

impl ActionSocket {
    /// Uses the socket from `$NIRI_SOCKET`.
    pub fn new() -> anyhow::Result<Self> {
        let path = Socket::default_socket_path().context("error finding the niri socket")?;
        Ok(Self::at(path))
    }

    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_owned(),
        }
    }

    pub fn send(&self, action: Action) -> anyhow::Result<()> {
        self.write(&Request::Action(action))
    }

    /// Sends an action that takes no arguments, by its name in niri.
    ///
    /// For example, `"FocusWorkspaceDown"`. Unknown names are only reported by niri in its
    /// reply.
    pub fn send_named(&self, name: &str) -> anyhow::Result<()> {
        self.write(&json!({ "Action": { name: {} } }))
    }

    fn write(&self, request: &impl Serialize) -> anyhow::Result<()> {
        let mut buf = serde_json::to_string(request).context("error serializing the request")?;
        debug!("niri <- {buf}");
        buf.push('\n');

        let mut stream = Socket::connect_to(&self.path)
            .context("error connecting to niri")?
            .into_stream();
        let reader = stream
            .try_clone()
            .context("error cloning the action connection")?;

        stream
            .write_all(buf.as_bytes())
            .context("error writing to niri")?;

        thread::Builder::new()
            .name(String::from("niri action reply"))
            .spawn(move || {
                for line in BufReader::new(reader).lines() {
                    match line {
                        Ok(line) => debug!("niri -> {line}"),
                        Err(err) => {
                            debug!("error reading the action reply: {err}");
                            break;
                        }
                    }
                }
            })
            .context("error spawning the action reply reader")?;

        Ok(())
    }
}

pub fn handle_msg(msg: Msg) -> anyhow::Result<()> {
    let request = match msg {
        Msg::Action { action } => Request::Action(action),
        Msg::ActionName { name } => return ActionSocket::new()?.send_named(&name),
        Msg::Version => Request::Version,
    };

    let socket = Socket::connect().context("error connecting to niri")?;
    let reply = socket
        .send(request)
        .context("a communication error occurred")?;

    match reply {
        Ok(Response::Handled) => (),
        Ok(Response::Version(version)) => println!("niri {version}"),
        Err(message) => bail!("niri returned an error: {message}"),
    }

    Ok(())
}
