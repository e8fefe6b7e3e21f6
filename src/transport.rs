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

//! The sink transport layer.
//!
//! This module defines the [`Transport`] trait that all implementations must support, as well
//! as the UDP & TCP implementations. A transport sends exactly the bytes it is given: record
//! terminators & separators are the business of the formatters and handlers upstream, and a
//! failure to deliver is surfaced, never retried (a wrapping supervisor is expected to restart
//! the whole process).
//!
//! # Examples
//!
//! To send messages over UDP to a daemon listening on port 514 (the default) on localhost:
//!
//! ```rust,no_run
//! use supervisor_relay::transport::UdpTransport;
//! let transport = UdpTransport::new("localhost:514").unwrap();
//! ```

use crate::error::{Error, Result};

use backtrace::Backtrace;

use std::net::{TcpStream, ToSocketAddrs, UdpSocket};

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      transport mechanisms                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Operations all transport layers must support.
pub trait Transport {
    /// Send a slice of bytes on this transport mechanism.
    ///
    /// It would be nice to make this more general, to accept input in a variety of forms that
    /// might support zero-copy, but at the end of the day both UDP & TCP sockets operate on a
    /// contiguous slice of `u8`, so we require that our caller assemble one.
    fn send(&self, buf: &[u8]) -> Result<usize>;
}

/// Sending messages via UDP datagrams, one record per datagram.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Construct a [`Transport`] implementation via UDP at `addr`.
    pub fn new<A: ToSocketAddrs>(addr: A) -> Result<UdpTransport> {
        // Bind to any available port...
        let socket = UdpSocket::bind("0.0.0.0:0").map_err(|err| Error::Transport {
            source: Box::new(err),
            back: Backtrace::new(),
        })?;
        // and connect to the sink at `addr`:
        socket.connect(addr).map_err(|err| Error::Transport {
            source: Box::new(err),
            back: Backtrace::new(),
        })?;
        Ok(UdpTransport { socket })
    }
}

impl Transport for UdpTransport {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        self.socket.send(buf).map_err(|err| Error::Transport {
            source: Box::new(err),
            back: Backtrace::new(),
        })
    }
}

/// Sending messages via a TCP stream.
pub struct TcpTransport {
    socket: TcpStream,
}

impl TcpTransport {
    /// Construct a [`Transport`] implementation via TCP at `addr`.
    pub fn new<A: ToSocketAddrs>(addr: A) -> Result<TcpTransport> {
        Ok(TcpTransport {
            socket: TcpStream::connect(addr).map_err(|err| Error::Transport {
                source: Box::new(err),
                back: Backtrace::new(),
            })?,
        })
    }
}

impl Transport for TcpTransport {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        use std::io::Write;
        // `std::io::Write` wants a `&mut self` and we only have `&self`; `Write` is however
        // implemented on `&TcpStream` as well as `TcpStream`, so write through a `&TcpStream`
        // binding (a trick borrowed from tracing-subscriber's fmt layer).
        let mut writer: &TcpStream = &self.socket;
        writer.write_all(buf).map_err(|err| Error::Transport {
            source: Box::new(err),
            back: Backtrace::new(),
        })?;
        writer.flush().map_err(|err| Error::Transport {
            source: Box::new(err),
            back: Backtrace::new(),
        })?;

        Ok(buf.len())
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_udp_send() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let transport = UdpTransport::new(receiver.local_addr().unwrap()).unwrap();
        assert_eq!(transport.send(b"hello").unwrap(), 5);

        let mut buf = [0u8; 16];
        let n = receiver.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello");
    }

    #[test]
    fn test_tcp_connect_refused() {
        // Reserve a port and close it again so nothing is listening there.
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        assert!(matches!(
            TcpTransport::new(addr),
            Err(Error::Transport { .. })
        ));
    }
}
