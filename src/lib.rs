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
//! Relay [supervisord] process events to a remote [`syslog`] daemon or a line-delimited-JSON
//! TCP sink.
//!
//! [supervisord]: http://supervisord.org/events.html
//! [`syslog`]: https://en.wikipedia.org/wiki/Syslog
//!
//! # Introduction
//!
//! supervisord can attach an *event listener* to the processes it supervises: a child process
//! that receives event notifications (process output, state changes & so forth) over its own
//! stdin/stdout via a small request/acknowledge protocol. This crate is such a listener. It
//! speaks the event-notification protocol on one side and, on the other, forwards each event
//! to a remote log sink -- either a syslog receiver (UDP or TCP) or a newline-delimited-JSON
//! TCP endpoint -- so that output from supervised processes lands in centralized logging
//! without touching the supervised processes themselves.
//!
//! The pipeline decomposes the way the modules do:
//!
//! 1. [`protocol`] reads & acknowledges events (the one place where a single miscounted byte
//!    desynchronizes the exchange permanently -- every framing failure there is fatal);
//!
//! 2. [`record`] models one log entry, uniformly for both output formats;
//!
//! 3. [`template`] & [`formatter`] render a record as a syslog-style line or an ordered JSON
//!    object, per configurable message & date templates;
//!
//! 4. [`transport`] & [`handler`] pair a formatter with a UDP or TCP connection, selected by
//!    [`config`].
//!
//! Everything is single-threaded & blocking: one event is in flight at a time, and the
//! supervisor receives the acknowledgement for an event only after the sink write for that
//! event has completed.
//!
//! # Usage
//!
//! Under supervisord:
//!
//! ```text
//! [eventlistener:relay]
//! command = supervisor-relay
//! events = PROCESS_LOG
//! environment = SYSLOG_SERVER="logs.example.com",SYSLOG_PORT="514"
//! ```
//!
//! Programmatically:
//!
//! ```rust,no_run
//! use supervisor_relay::{config::Config, handler::new_handler, relay};
//!
//! let config = Config::from_env().unwrap();
//! if let Some(mut handler) = new_handler(&config).unwrap() {
//!     let stdin = std::io::stdin();
//!     let stdout = std::io::stdout();
//!     relay::run(stdin.lock(), stdout.lock(), handler.as_mut()).unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod facility;
pub mod formatter;
pub mod handler;
pub mod protocol;
pub mod record;
pub mod relay;
pub mod template;
pub mod transport;
