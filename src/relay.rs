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

//! The driver loop.
//!
//! [`run`] wires the [`EventStream`] to the configured [`Handler`]: each event becomes one
//! informational [`Record`] (name from `processname`, pid from `pid`, message from the event
//! body) dispatched to exactly one `handle` call. There is no queue & no backpressure: a slow
//! sink blocks the loop, which blocks the event's acknowledgement, which blocks the
//! supervisor's own delivery. One event is in flight at a time, by design.
//!
//! The loop runs until the process is terminated externally, the supervisor closes its end at
//! a frame boundary, or an unrecoverable protocol/sink error surfaces -- in which case the
//! error propagates; nothing here retries.

use crate::{
    error::Result,
    handler::Handler,
    protocol::EventStream,
    record::Record,
};

use tracing::debug;

use std::io::{BufRead, Write};

/// Relay supervisor events from `input`/`output` to `handler`, until end-of-stream or error.
pub fn run<R: BufRead, W: Write>(input: R, output: W, handler: &mut dyn Handler) -> Result<()> {
    for event in EventStream::new(input, output) {
        let event = event?;
        let record = Record::from_event(&event)?;
        debug!("relaying event from {}[{}]", record.name, record.process);
        handler.handle(&record)?;
    }
    Ok(())
}
