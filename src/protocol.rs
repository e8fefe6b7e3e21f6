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

//! The supervisor event-notification protocol.
//!
//! supervisord talks to an event listener over the listener's stdin/stdout using a line-oriented
//! handshake with exact-byte payload framing:
//!
//! ```text
//! listener   -> supervisor   READY\n
//! supervisor -> listener     ver:3.0 server:supervisor ... len:35\n
//! supervisor -> listener     <exactly `len` bytes of payload>
//! listener   -> supervisor   RESULT 2\nOK
//! ```
//!
//! The payload's first line is itself a set of `key:value` tokens (the *event* headers, including
//! `processname` & `pid`); everything after the first newline is the event body.
//!
//! [`EventStream`] drives this exchange as a blocking [`Iterator`]. The protocol carries no
//! resynchronization marker, so the stream is not restartable: any parse failure or short read
//! leaves the byte offset unknown and must terminate the process. Nothing in this module retries.

use crate::error::{Error, Result};

use backtrace::Backtrace;

use std::{
    collections::HashMap,
    io::{BufRead, Write},
};

/// Readiness token written to the supervisor before each event is read.
pub const READY: &[u8] = b"READY\n";

/// Acknowledgement written after each event is consumed. Two lines, no trailing newline.
pub const ACKNOWLEDGEMENT: &[u8] = b"RESULT 2\nOK";

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         header parsing                                         //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Parse one line of space-separated `key:value` tokens into a map.
///
/// Every token must contain exactly one `:`; a token with none (or more than one) is a fatal
/// parse error. No side effects.
pub fn parse_headers(line: &str) -> Result<HashMap<String, String>> {
    line.split_whitespace()
        .map(|token| {
            let mut parts = token.split(':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(key), Some(value), None) => Ok((key.to_string(), value.to_string())),
                _ => Err(Error::BadHeaderToken {
                    token: token.to_string(),
                    back: Backtrace::new(),
                }),
            }
        })
        .collect()
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                           struct Event                                         //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// One supervisor-reported occurrence: the event header map plus the raw body payload.
///
/// Only `processname` & `pid` are examined by this crate; the remaining headers (event name,
/// server epoch & so forth) are protocol metadata, passed through unexamined.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl Event {
    /// The name of the supervised process this event concerns.
    pub fn process_name(&self) -> Result<&str> {
        self.headers
            .get("processname")
            .map(String::as_str)
            .ok_or_else(|| Error::MissingHeader {
                name: "processname",
                back: Backtrace::new(),
            })
    }
    /// The process id of the supervised process, integer-parsed.
    pub fn pid(&self) -> Result<u32> {
        let value = self.headers.get("pid").ok_or_else(|| Error::MissingHeader {
            name: "pid",
            back: Backtrace::new(),
        })?;
        value.parse().map_err(|_| Error::BadInteger {
            name: "pid",
            value: value.clone(),
            back: Backtrace::new(),
        })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        struct EventStream                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A lazy, infinite, non-restartable sequence of [`Event`]s read from a supervisor.
///
/// There is exactly one producer & one consumer, and no concurrency: `next()` blocks on the
/// input stream. The acknowledgement for event N is a side effect of *requesting* event N+1
/// (mirroring the one-event-in-flight request/acknowledge contract), or of dropping the stream
/// with an acknowledgement still pending -- either way it is written exactly once per event,
/// after the consumer has had the event in hand.
///
/// A clean end-of-stream at a frame boundary (zero bytes where a header line would begin) ends
/// the iterator. End-of-stream anywhere else is a framing error.
pub struct EventStream<R, W: Write> {
    input: R,
    output: W,
    pending_ack: bool,
}

impl<R: BufRead, W: Write> EventStream<R, W> {
    pub fn new(input: R, output: W) -> EventStream<R, W> {
        EventStream {
            input,
            output,
            pending_ack: false,
        }
    }

    fn acknowledge(&mut self) -> Result<()> {
        self.output.write_all(ACKNOWLEDGEMENT)?;
        self.output.flush()?;
        self.pending_ack = false;
        Ok(())
    }

    /// One full AwaitHeader/AwaitPayload pass: emit readiness, read & parse the header line,
    /// read exactly `len` bytes, split them into event headers & body.
    fn read_event(&mut self) -> Result<Option<Event>> {
        // Readiness is a handshake step, not log output; it goes to the supervisor stream and
        // is flushed immediately.
        self.output.write_all(READY)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let headers = parse_headers(&line)?;
        let len = headers.get("len").ok_or_else(|| Error::MissingHeader {
            name: "len",
            back: Backtrace::new(),
        })?;
        let len: usize = len.parse().map_err(|_| Error::BadInteger {
            name: "len",
            value: len.clone(),
            back: Backtrace::new(),
        })?;

        // The protocol contract guarantees exactly `len` bytes will arrive; a short read means
        // the stream is desynchronized, not that we should wait and retry.
        let mut payload = vec![0u8; len];
        self.input.read_exact(&mut payload).map_err(|err| {
            if err.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::UnexpectedEof {
                    what: "event payload",
                    back: Backtrace::new(),
                }
            } else {
                err.into()
            }
        })?;
        let payload = String::from_utf8(payload)?;

        let (header_line, body) =
            payload
                .split_once('\n')
                .ok_or_else(|| Error::MissingBodySeparator {
                    back: Backtrace::new(),
                })?;
        Ok(Some(Event {
            headers: parse_headers(header_line)?,
            body: body.to_string(),
        }))
    }
}

impl<R: BufRead, W: Write> Iterator for EventStream<R, W> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pending_ack {
            if let Err(err) = self.acknowledge() {
                return Some(Err(err));
            }
        }
        match self.read_event() {
            Ok(Some(event)) => {
                self.pending_ack = true;
                Some(Ok(event))
            }
            Ok(None) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl<R, W: Write> Drop for EventStream<R, W> {
    /// An event that was read but never acknowledged would leave the supervisor's protocol
    /// desynchronized on restart, so a pending acknowledgement is written on the way out.
    fn drop(&mut self) {
        if self.pending_ack {
            let _ = self
                .output
                .write_all(ACKNOWLEDGEMENT)
                .and_then(|_| self.output.flush());
        }
    }
}
