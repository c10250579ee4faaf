//! Decoding of event stream lines.
//!
//! After an [`EventStream`](crate::Request::EventStream) request, niri writes one JSON object per
//! line. The first one is the [`Reply`] to the request itself, every following one is an
//! [`Event`]. Both are objects with exactly one key naming the variant. This module checks that
//! shape explicitly instead of trusting the first key that happens to be present.

use std::error::Error;
use std::fmt;

use serde_json::{Map, Value};

use crate::{Event, Reply};

/// A decoded line from the event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// Reply to the request that started the stream.
    Reply(Reply),
    /// A compositor event.
    Event(Event),
}

/// Error decoding a line from the event stream.
#[derive(Debug)]
pub enum StreamError {
    /// The line is not valid JSON.
    Json(serde_json::Error),
    /// The line is valid JSON, but not an object.
    NotAnObject,
    /// The object has no non-null fields.
    NoVariant,
    /// The object has more than one non-null field.
    MultipleVariants(Vec<String>),
    /// The single field did not decode into a known event.
    ///
    /// This is expected when niri is newer than this crate and sends events it does not know.
    Event {
        /// The key of the populated field.
        name: String,
        /// Why decoding failed.
        source: serde_json::Error,
    },
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Json(err) => write!(f, "invalid JSON: {err}"),
            StreamError::NotAnObject => f.write_str("message is not a JSON object"),
            StreamError::NoVariant => f.write_str("message has no fields set"),
            StreamError::MultipleVariants(names) => {
                write!(f, "message has several fields set: {}", names.join(", "))
            }
            StreamError::Event { name, source } => {
                write!(f, "error decoding {name} event: {source}")
            }
        }
    }
}

impl Error for StreamError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StreamError::Json(err) => Some(err),
            StreamError::Event { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Decodes one line of the event stream.
///
/// Fields set to `null` do not count as populated, so `{"WindowClosed": {"id": 1}, "Ok": null}`
/// is a valid `WindowClosed` event.
pub fn parse_line(line: &str) -> Result<StreamMessage, StreamError> {
    let value: Value = serde_json::from_str(line).map_err(StreamError::Json)?;
    let Value::Object(map) = value else {
        return Err(StreamError::NotAnObject);
    };

    let mut populated: Vec<(String, Value)> =
        map.into_iter().filter(|(_, value)| !value.is_null()).collect();

    let (name, value) = match populated.len() {
        0 => return Err(StreamError::NoVariant),
        1 => populated.remove(0),
        _ => {
            let names = populated.into_iter().map(|(name, _)| name).collect();
            return Err(StreamError::MultipleVariants(names));
        }
    };

    let is_reply = name == "Ok" || name == "Err";

    let mut single = Map::new();
    single.insert(name.clone(), value);
    let single = Value::Object(single);

    if is_reply {
        serde_json::from_value(single)
            .map(StreamMessage::Reply)
            .map_err(|source| StreamError::Event { name, source })
    } else {
        serde_json::from_value(single)
            .map(StreamMessage::Event)
            .map_err(|source| StreamError::Event { name, source })
    }
}
