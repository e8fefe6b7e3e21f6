// Copyright (C) 2026 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of supervisor-relay.
//
// supervisor-relay is free software: you can redistribute it and/or modify it under the terms of
// the GNU General Public License as published by the Free Software Foundation, either version 3 of
// the License, or (at your option) any later version.
//
// supervisor-relay is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See
// the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with supervisor-relay.
// If not, see <http://www.gnu.org/licenses/>.

//! The in-memory representation of one log record.
//!
//! A [`Record`] is pure data: the fixed, well-known attributes (timestamp, process name, pid,
//! level, body) used uniformly by both formatters, plus an *explicit* ordered map of extra
//! fields. Extras are always populated deliberately by whoever builds the record; they are
//! never discovered by inspecting the value, and the fields in [`RESERVED_FIELDS`] -- the names
//! the record model itself supplies -- are never re-emitted from the extras.
//!
//! A record is built by the driver loop from one [`Event`], handed by reference to exactly one
//! handler call, and dropped; nothing retains it past that single dispatch.

use crate::{
    error::Result,
    facility::Level,
    protocol::Event,
};

use chrono::{DateTime, Local};
use serde_json::{Map, Value};

/// Field names the record model itself supplies. Extra fields must never re-emit one of these,
/// lest the output carry duplicate or conflicting keys.
pub const RESERVED_FIELDS: &[&str] = &[
    "asctime",
    "created",
    "hostname",
    "levelname",
    "levelno",
    "message",
    "msg",
    "name",
    "process",
];

/// True if `name` is one of the [`RESERVED_FIELDS`].
pub fn is_reserved(name: &str) -> bool {
    RESERVED_FIELDS.contains(&name)
}

/// The payload of a [`Record`]: either plain text, or a mapping of arbitrary extra fields.
///
/// The two are mutually exclusive by construction: a structured body means the scalar `message`
/// field is absent and the mapping's keys are merged into the output instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Structured(Map<String, Value>),
}

/// One logical log entry.
#[derive(Debug, Clone)]
pub struct Record {
    /// When the record was constructed; formatted lazily, per the date template.
    pub timestamp: DateTime<Local>,
    /// Name of the supervised process that produced the event.
    pub name: String,
    /// Process id of the supervised process.
    pub process: u32,
    pub level: Level,
    pub body: Body,
    /// Explicit, ordered extra fields; merged into JSON output after the template fields and
    /// any structured-body extras, minus the reserved set.
    pub extra_fields: Map<String, Value>,
}

impl Record {
    pub fn new(name: String, process: u32, body: Body) -> Record {
        Record {
            timestamp: Local::now(),
            name,
            process,
            level: Level::LOG_INFO,
            body,
            extra_fields: Map::new(),
        }
    }

    /// Build an informational record from one supervisor event.
    pub fn from_event(event: &Event) -> Result<Record> {
        Ok(Record::new(
            event.process_name()?.to_string(),
            event.pid()?,
            Body::Text(event.body.clone()),
        ))
    }

    /// The scalar message, or `None` when the body is structured.
    pub fn message(&self) -> Option<&str> {
        match &self.body {
            Body::Text(text) => Some(text),
            Body::Structured(_) => None,
        }
    }

    /// The structured-body extras, or `None` when the body is plain text.
    pub fn structured(&self) -> Option<&Map<String, Value>> {
        match &self.body {
            Body::Text(_) => None,
            Body::Structured(extras) => Some(extras),
        }
    }

    /// Attach one extra field. Last write wins on duplicate keys.
    pub fn with_extra<V: Into<Value>>(mut self, key: &str, value: V) -> Record {
        self.extra_fields.insert(key.to_string(), value.into());
        self
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use std::collections::HashMap;

    #[test]
    fn test_message_and_structured_are_exclusive() {
        let text = Record::new("messages".to_string(), 42, Body::Text("hi".to_string()));
        assert_eq!(text.message(), Some("hi"));
        assert!(text.structured().is_none());

        let mut extras = Map::new();
        extras.insert("message".to_string(), Value::String("other".to_string()));
        let structured = Record::new("messages".to_string(), 42, Body::Structured(extras));
        assert!(structured.message().is_none());
        assert!(structured.structured().is_some());
    }

    #[test]
    fn test_from_event() {
        let event = Event {
            headers: HashMap::from([
                ("processname".to_string(), "messages".to_string()),
                ("pid".to_string(), "123".to_string()),
            ]),
            body: "Test 0\n".to_string(),
        };
        let record = Record::from_event(&event).unwrap();
        assert_eq!(record.name, "messages");
        assert_eq!(record.process, 123);
        assert_eq!(record.level, Level::LOG_INFO);
        assert_eq!(record.message(), Some("Test 0\n"));

        let unnumbered = Event {
            headers: HashMap::from([
                ("processname".to_string(), "messages".to_string()),
                ("pid".to_string(), "not-a-pid".to_string()),
            ]),
            body: String::new(),
        };
        assert!(Record::from_event(&unnumbered).is_err());
    }

    #[test]
    fn test_reserved() {
        assert!(is_reserved("message"));
        assert!(is_reserved("asctime"));
        assert!(!is_reserved("request_id"));
    }
}
