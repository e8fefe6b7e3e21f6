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

//! supervisor-relay entry point.

use supervisor_relay::{config::Config, error::Result, handler::new_handler, relay};

fn relay_events() -> Result<()> {
    let config = Config::from_env()?;
    match new_handler(&config)? {
        Some(mut handler) => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            relay::run(stdin.lock(), stdout.lock(), handler.as_mut())
        }
        None => {
            // No recognized sink selected: relay nothing, but stay up without consuming the
            // supervisor's stream, leaving its protocol untouched.
            tracing::warn!("no handler configured; idling");
            loop {
                std::thread::park();
            }
        }
    }
}

fn main() {
    // stdout belongs to the supervisor protocol; our own diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = relay_events() {
        tracing::error!("{}", err);
        std::process::exit(1);
    }
}
