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

//! Sink handlers.
//!
//! A [`Handler`] pairs one formatter with one network transport; [`new_handler`] builds the
//! one handler the configuration selects (or none at all, when the sink-type key names neither
//! recognized sink -- a degenerate but documented mode in which the driver relays nothing).

use crate::{
    config::{Config, SinkType, SyslogProto},
    error::Result,
    facility::Facility,
    formatter::{JsonFormatter, RecordFormatter, SyslogFormatter},
    record::Record,
    template::TemplateResolver,
    transport::{TcpTransport, Transport, UdpTransport},
};

use bytes::BufMut;

/// Operations all sink handlers must support: format one record & put it on the wire.
pub trait Handler {
    fn handle(&mut self, record: &Record) -> Result<()>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       struct SyslogHandler                                     //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Write records to a syslog endpoint over UDP or TCP.
///
/// Each outbound message is `<PRI>` (facility ORed with the record's level) followed by the
/// formatted line. The trailing NUL some platform syslog clients append by default is
/// deliberately absent here: the sinks this relay targets treat NUL as message content.
pub struct SyslogHandler<T: Transport> {
    formatter: SyslogFormatter,
    transport: T,
    facility: Facility,
}

impl<T: Transport> SyslogHandler<T> {
    pub fn new(formatter: SyslogFormatter, transport: T) -> SyslogHandler<T> {
        SyslogHandler {
            formatter,
            transport,
            facility: Facility::default(),
        }
    }

    pub fn facility(mut self, facility: Facility) -> SyslogHandler<T> {
        self.facility = facility;
        self
    }
}

impl<T: Transport> Handler for SyslogHandler<T> {
    fn handle(&mut self, record: &Record) -> Result<()> {
        let line = self.formatter.format(record)?;
        let mut buf =
            format!("<{}>", self.facility as u8 | record.level as u8).into_bytes();
        buf.put_slice(&line);
        self.transport.send(&buf)?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      struct TcpJsonHandler                                     //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Write newline-delimited JSON records over a TCP stream.
pub struct TcpJsonHandler {
    formatter: JsonFormatter,
    transport: TcpTransport,
}

impl TcpJsonHandler {
    pub fn new(formatter: JsonFormatter, transport: TcpTransport) -> TcpJsonHandler {
        TcpJsonHandler {
            formatter,
            transport,
        }
    }
}

impl Handler for TcpJsonHandler {
    fn handle(&mut self, record: &Record) -> Result<()> {
        let json = self.formatter.format(record)?;
        let mut buf = Vec::with_capacity(json.len() + 1);
        buf.put_slice(&json);
        buf.put_u8(b'\n');
        self.transport.send(&buf)?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       handler selection                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Build the handler the configuration selects, if any.
///
/// An unrecognized sink type yields `Ok(None)`: not an error, just nothing to do.
pub fn new_handler(config: &Config) -> Result<Option<Box<dyn Handler>>> {
    match config.sink {
        SinkType::Syslog => {
            let formatter = SyslogFormatter::new(TemplateResolver::new(config));
            let addr = (config.syslog_host.as_str(), config.syslog_port);
            let handler: Box<dyn Handler> = match config.syslog_proto {
                SyslogProto::Udp => {
                    Box::new(SyslogHandler::new(formatter, UdpTransport::new(addr)?))
                }
                SyslogProto::Stream => {
                    Box::new(SyslogHandler::new(formatter, TcpTransport::new(addr)?))
                }
            };
            Ok(Some(handler))
        }
        SinkType::TcpJson => {
            let formatter = JsonFormatter::new(TemplateResolver::new(config));
            let transport =
                TcpTransport::new((config.tcp_host.as_str(), config.tcp_port))?;
            Ok(Some(Box::new(TcpJsonHandler::new(formatter, transport))))
        }
        SinkType::Disabled => Ok(None),
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use crate::record::Body;

    use std::io::{BufRead, BufReader};
    use std::net::{TcpListener, UdpSocket};

    fn test_config<F: Fn(&str) -> Option<String>>(lookup: F) -> Config {
        let mut config = Config::from_lookup(lookup).unwrap();
        config.hostname = "bree".to_string();
        config
    }

    #[test]
    fn test_unknown_sink_selects_no_handler() {
        let config = test_config(|key| {
            (key == "SUPERVISOR_LOG_TYPE").then(|| "carrier-pigeon".to_string())
        });
        assert!(new_handler(&config).unwrap().is_none());
    }

    #[test]
    fn test_syslog_handler_suppresses_nul() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = receiver.local_addr().unwrap().port();
        let config = test_config(|key| match key {
            "SYSLOG_PORT" => Some(port.to_string()),
            _ => None,
        });

        let mut handler = new_handler(&config).unwrap().unwrap();
        let record = Record::new("messages".to_string(), 123, Body::Text("Test 0\n".to_string()));
        handler.handle(&record).unwrap();

        let mut buf = [0u8; 1024];
        let n = receiver.recv(&mut buf).unwrap();
        let message = std::str::from_utf8(&buf[..n]).unwrap();
        assert!(message.starts_with("<14>"));
        assert!(message.ends_with("messages[123]: Test 0 \n"), "{:?}", message);
        assert!(!message.contains('\0'));
    }

    #[test]
    fn test_tcp_json_handler_writes_one_json_line() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let config = test_config(|key| match key {
            "SUPERVISOR_LOG_TYPE" => Some("tcp_json".to_string()),
            "TCP_PORT" => Some(port.to_string()),
            _ => None,
        });

        let mut handler = new_handler(&config).unwrap().unwrap();
        let (connection, _) = listener.accept().unwrap();

        let record =
            Record::new("messages".to_string(), 123, Body::Text("Test 0\n".to_string()));
        handler.handle(&record).unwrap();

        let mut line = String::new();
        BufReader::new(connection).read_line(&mut line).unwrap();
        assert!(line.ends_with('\n'));
        let object: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(object["name"], "messages");
        assert_eq!(object["process"], 123);
        assert_eq!(object["message"], "Test 0\n");
        assert!(object["asctime"].is_string());
    }
}
