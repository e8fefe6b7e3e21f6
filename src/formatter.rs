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

//! Record formatting primitives.
//!
//! This module defines the [`RecordFormatter`] trait and its two implementations: a
//! syslog-style line formatter and a JSON object formatter. Each holds a
//! [`TemplateResolver`] by value & calls into it explicitly; the two share no other state.

use crate::{
    error::{Error, Result},
    record::Record,
    template::TemplateResolver,
};

use backtrace::Backtrace;
use serde_json::{Map, Value};

use std::{collections::HashSet, ops::Deref};

/// Operations both formatters support.
///
/// The associated type `Output` is designed to make illegal states unrepresentable: the thing
/// handed to a [`Transport`] must have been produced by a formatter, not just any slice of
/// `u8` a caller happened to have. Hence the associated type, with the constraint that it be
/// dereferenceable to a slice of `u8` so the transport can put it on the wire.
///
/// [`Transport`]: crate::transport::Transport
pub trait RecordFormatter {
    type Output: Deref<Target = [u8]>;
    fn format(&self, record: &Record) -> Result<Self::Output>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      struct SyslogFormatter                                    //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Render a record as a single syslog-style text line.
///
/// Every template field is substituted into the message template (unresolved fields render
/// empty), the timestamp renders per the date template, embedded newlines collapse to single
/// spaces, and the line ends with the sink's `\n` terminator.
pub struct SyslogFormatter {
    resolver: TemplateResolver,
}

impl SyslogFormatter {
    pub fn new(resolver: TemplateResolver) -> SyslogFormatter {
        SyslogFormatter { resolver }
    }
}

impl RecordFormatter for SyslogFormatter {
    type Output = Vec<u8>;
    fn format(&self, record: &Record) -> Result<Vec<u8>> {
        let line = self.resolver.render(|field| match field {
            "asctime" => Some(self.resolver.format_time(&record.timestamp)),
            "name" => Some(record.name.clone()),
            "process" => Some(record.process.to_string()),
            "levelname" => Some(record.level.severity().to_string()),
            "message" => record.message().map(str::to_string),
            _ => None,
        });

        let mut buf = line.replace('\n', " ").into_bytes();
        use bytes::BufMut;
        buf.put_u8(b'\n');
        Ok(buf)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       struct JsonFormatter                                     //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Render a record as one JSON object.
///
/// The object's keys are, in order: every field the message template references (in template
/// order), then the structured-body extras (overwriting any template field already set), then
/// every remaining explicit record extra that is neither reserved nor already present. The
/// skip set -- template fields plus [`RESERVED_FIELDS`] -- keeps extras from silently
/// duplicating a field the record itself supplies; a collision is deduped, never an error.
///
/// For the same record & template the key set and values are identical across runs, and key
/// insertion order is preserved through serialization.
///
/// [`RESERVED_FIELDS`]: crate::record::RESERVED_FIELDS
pub struct JsonFormatter {
    resolver: TemplateResolver,
    skip_fields: HashSet<String>,
}

impl JsonFormatter {
    pub fn new(resolver: TemplateResolver) -> JsonFormatter {
        let skip_fields = resolver
            .fields()
            .iter()
            .cloned()
            .chain(crate::record::RESERVED_FIELDS.iter().map(|s| s.to_string()))
            .collect();
        JsonFormatter {
            resolver,
            skip_fields,
        }
    }

    /// The value of one well-known field, as JSON. The timestamp is only ever formatted here,
    /// i.e. only when the template actually references it.
    fn template_value(&self, record: &Record, field: &str) -> Value {
        match field {
            "asctime" => Value::String(self.resolver.format_time(&record.timestamp)),
            "name" => Value::String(record.name.clone()),
            "process" => Value::Number(record.process.into()),
            "levelname" => Value::String(record.level.severity().to_string()),
            "message" => match record.message() {
                Some(text) => Value::String(text.to_string()),
                None => Value::Null,
            },
            _ => Value::Null,
        }
    }
}

impl RecordFormatter for JsonFormatter {
    type Output = Vec<u8>;
    fn format(&self, record: &Record) -> Result<Vec<u8>> {
        let mut object = Map::new();

        for field in self.resolver.fields() {
            object.insert(field.clone(), self.template_value(record, field));
        }

        if let Some(extras) = record.structured() {
            for (key, value) in extras {
                object.insert(key.clone(), value.clone());
            }
        }

        for (key, value) in &record.extra_fields {
            if !self.skip_fields.contains(key) && !object.contains_key(key) {
                object.insert(key.clone(), value.clone());
            }
        }

        let text = serde_json::to_string(&object).map_err(|err| Error::Format {
            source: Box::new(err),
            back: Backtrace::new(),
        })?;
        Ok(text.into_bytes())
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use crate::{config::Config, record::Body};

    fn resolver() -> TemplateResolver {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.hostname = "bree".to_string();
        TemplateResolver::new(&config)
    }

    fn record(body: Body) -> Record {
        Record::new("messages".to_string(), 123, body)
    }

    #[test]
    fn test_syslog_line_shape() {
        let formatter = SyslogFormatter::new(resolver());
        let line = formatter
            .format(&record(Body::Text("Test 0\n".to_string())))
            .unwrap();
        let line = std::str::from_utf8(&line).unwrap();
        assert!(line.contains(" bree messages[123]: Test 0 \n"), "{:?}", line);
        assert!(!line.contains('\0'));
    }

    #[test]
    fn test_syslog_collapses_newlines() {
        let formatter = SyslogFormatter::new(resolver());
        let line = formatter
            .format(&record(Body::Text("line1\nline2".to_string())))
            .unwrap();
        let line = std::str::from_utf8(&line).unwrap();
        assert!(line.contains("line1 line2"));
        // One newline only: the terminator.
        assert_eq!(line.match_indices('\n').count(), 1);
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_syslog_hostname_stable_across_instances() {
        let config = Config::from_lookup(|_| None).unwrap();
        let first = TemplateResolver::new(&config);
        let second = TemplateResolver::new(&config);
        let record = record(Body::Text("x".to_string()));
        assert_eq!(
            SyslogFormatter::new(first).format(&record).unwrap(),
            SyslogFormatter::new(second).format(&record).unwrap()
        );
    }

    #[test]
    fn test_json_plain_text_record() {
        let formatter = JsonFormatter::new(resolver());
        let text = formatter
            .format(&record(Body::Text("Test message".to_string())))
            .unwrap();
        let object: Value = serde_json::from_slice(&text).unwrap();
        assert_eq!(object["name"], "messages");
        assert_eq!(object["message"], "Test message");
        assert_eq!(object["process"], 123);
        assert!(object["asctime"].is_string());
    }

    #[test]
    fn test_json_key_order() {
        let formatter = JsonFormatter::new(resolver());
        let text = formatter
            .format(
                &record(Body::Text("x".to_string())).with_extra("request_id", "r-1"),
            )
            .unwrap();
        let object: Value = serde_json::from_slice(&text).unwrap();
        let keys: Vec<&str> = object
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        // Template order first, then the extras.
        assert_eq!(
            keys,
            vec!["asctime", "name", "process", "message", "request_id"]
        );
    }

    #[test]
    fn test_json_determinism() {
        let formatter = JsonFormatter::new(resolver());
        let record = record(Body::Text("Test message".to_string())).with_extra("attempt", 2);
        let first: Value =
            serde_json::from_slice(&formatter.format(&record).unwrap()).unwrap();
        let second: Value =
            serde_json::from_slice(&formatter.format(&record).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_json_structured_body_replaces_message() {
        let mut extras = Map::new();
        extras.insert(
            "message".to_string(),
            Value::String("from extras".to_string()),
        );
        extras.insert("code".to_string(), Value::Number(7.into()));

        let formatter = JsonFormatter::new(resolver());
        let text = formatter.format(&record(Body::Structured(extras))).unwrap();
        let object: Value = serde_json::from_slice(&text).unwrap();

        // Exactly one `message` key, carrying the extras' value.
        assert_eq!(
            serde_json::to_string(&object)
                .unwrap()
                .matches("\"message\"")
                .count(),
            1
        );
        assert_eq!(object["message"], "from extras");
        assert_eq!(object["code"], 7);
    }

    #[test]
    fn test_json_reserved_extras_are_skipped() {
        let formatter = JsonFormatter::new(resolver());
        let record = record(Body::Text("body".to_string()))
            .with_extra("levelno", 20)
            .with_extra("request_id", "r-1");
        let object: Value =
            serde_json::from_slice(&formatter.format(&record).unwrap()).unwrap();
        // `levelno` is reserved; `request_id` is not.
        assert!(object.get("levelno").is_none());
        assert_eq!(object["request_id"], "r-1");
        assert_eq!(object["message"], "body");
    }

    #[test]
    fn test_json_asctime_only_when_referenced() {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.hostname = "bree".to_string();
        config.message_format = "%(name)s: %(message)s".to_string();
        let formatter = JsonFormatter::new(TemplateResolver::new(&config));
        let object: Value = serde_json::from_slice(
            &formatter
                .format(&record(Body::Text("x".to_string())))
                .unwrap(),
        )
        .unwrap();
        assert!(object.get("asctime").is_none());
    }
}
