//! Helper for blocking communication over the niri socket.

use std::env;
use std::io::{self, BufRead, BufReader, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};

use crate::{Reply, Request};

/// Name of the environment variable containing the niri IPC socket path.
pub const SOCKET_PATH_ENV: &str = "NIRI_SOCKET";

/// Helper for blocking communication over the niri socket.
///
/// A `Socket` is one connection to niri. It can either answer a single request with
/// [`send`](Self::send), or be turned into an event stream with
/// [`into_event_stream`](Self::into_event_stream). niri reads a single request per connection,
/// so further requests need a new `Socket`.
pub struct Socket {
    stream: UnixStream,
}

impl Socket {
    /// Get path to the default niri IPC socket.
    ///
    /// This returns path taken from the [`SOCKET_PATH_ENV`] environment variable.
    pub fn default_socket_path() -> io::Result<PathBuf> {
        env::var_os(SOCKET_PATH_ENV).map(PathBuf::from).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{SOCKET_PATH_ENV} is not set, are you running this within niri?"),
            )
        })
    }

    /// Connects to the default niri IPC socket.
    ///
    /// This is equivalent to calling [`Self::connect_to`] with the path taken from the
    /// [`SOCKET_PATH_ENV`] environment variable.
    pub fn connect() -> io::Result<Self> {
        Self::connect_to(Self::default_socket_path()?)
    }

    /// Connects to the niri IPC socket at the given path.
    pub fn connect_to(path: impl AsRef<Path>) -> io::Result<Self> {
        let stream = UnixStream::connect(path.as_ref())?;
        Ok(Self { stream })
    }

    /// Wraps an already connected stream.
    pub fn from_stream(stream: UnixStream) -> Self {
        Self { stream }
    }

    /// Sends a request to niri and returns the response.
    ///
    /// Return values:
    ///
    /// * `Ok(Ok(response))`: successful [`Response`](crate::Response) from niri
    /// * `Ok(Err(message))`: error message from niri
    /// * `Err(error)`: error communicating with niri
    pub fn send(self, request: Request) -> io::Result<Reply> {
        let Self { mut stream } = self;

        let mut buf = serde_json::to_string(&request)?;
        buf.push('\n');
        stream.write_all(buf.as_bytes())?;
        stream.shutdown(Shutdown::Write)?;

        let mut reader = BufReader::new(stream);

        buf.clear();
        reader.read_line(&mut buf)?;

        let reply = serde_json::from_str(&buf)?;
        Ok(reply)
    }

    /// Requests an event stream and returns a reader over its lines.
    ///
    /// The reply to the request is not consumed here: it arrives as the first line, and
    /// [`parse_line`](crate::stream::parse_line) decodes it as a
    /// [`StreamMessage::Reply`](crate::stream::StreamMessage::Reply).
    pub fn into_event_stream(self) -> io::Result<BufReader<UnixStream>> {
        let Self { mut stream } = self;

        let mut buf = serde_json::to_string(&Request::EventStream)?;
        buf.push('\n');
        stream.write_all(buf.as_bytes())?;
        stream.flush()?;

        Ok(BufReader::new(stream))
    }

    /// Returns the underlying connection.
    pub fn into_stream(self) -> UnixStream {
        self.stream
    }
}
