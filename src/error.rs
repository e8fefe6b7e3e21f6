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
//! [supervisor-relay](crate) errors

use backtrace::Backtrace;

/// [supervisor-relay](crate) error type
///
/// [supervisor-relay](crate) eschews libraries like [thiserror], [anyhow] & [Snafu] in favor of
/// a straightforward enumeration with a few match arms chosen on the basis of what the caller
/// will need to respond. There isn't much a caller *can* do: every framing error leaves the
/// supervisor protocol at an unknown byte offset, and so is unrecoverable by construction.
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
/// [Snafu]: https://docs.rs/snafu/latest/snafu
#[non_exhaustive]
pub enum Error {
    /// A `key:value` header token with other than exactly one separator
    BadHeaderToken { token: String, back: Backtrace },
    /// A header carried a non-numeric value where an integer was required (`len`, `pid`)
    BadInteger {
        name: &'static str,
        value: String,
        back: Backtrace,
    },
    /// A configured port could not be parsed
    BadPort {
        name: &'static str,
        value: String,
        back: Backtrace,
    },
    /// An event payload that was not UTF-8 encoded
    BadUtf8 {
        source: std::string::FromUtf8Error,
        back: Backtrace,
    },
    /// Failed to serialize a record
    Format {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// General I/O error on the supervisor streams
    Io {
        source: std::io::Error,
        back: Backtrace,
    },
    /// An event payload with no newline between event headers and event body
    MissingBodySeparator { back: Backtrace },
    /// A required header key was absent (`len`, `processname`, `pid`)
    MissingHeader {
        name: &'static str,
        back: Backtrace,
    },
    /// General transport layer error
    Transport {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// The supervisor stream ended in the middle of a frame
    UnexpectedEof {
        what: &'static str,
        back: Backtrace,
    },
}

impl std::convert::From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            source: err,
            back: Backtrace::new(),
        }
    }
}

impl std::convert::From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::BadUtf8 {
            source: err,
            back: Backtrace::new(),
        }
    }
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadHeaderToken { token, .. } => {
                write!(
                    f,
                    "Header token {:?} does not have exactly one ':' separator",
                    token
                )
            }
            Error::BadInteger { name, value, .. } => {
                write!(f, "Header '{}' carried non-integer value {:?}", name, value)
            }
            Error::BadPort { name, value, .. } => {
                write!(f, "{} value {:?} is not a valid port number", name, value)
            }
            Error::BadUtf8 { source, .. } => {
                write!(f, "Event payload is not UTF-8 encoded: {}", source)
            }
            Error::Format { source, .. } => {
                write!(f, "While serializing a record, got {}", source)
            }
            Error::Io { source, .. } => write!(f, "I/O error: {}", source),
            Error::MissingBodySeparator { .. } => {
                write!(
                    f,
                    "Event payload has no newline separating headers from body"
                )
            }
            Error::MissingHeader { name, .. } => {
                write!(f, "Required header '{}' is absent", name)
            }
            Error::Transport { source, .. } => write!(f, "Transport error: {}", source),
            Error::UnexpectedEof { what, .. } => {
                write!(f, "The supervisor stream ended while reading {}", what)
            }
            _ => write!(f, "Other supervisor-relay error"),
        }
    }
}

impl std::fmt::Debug for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadHeaderToken { token: _, back } => write!(f, "{}\n{:?}", self, back),
            Error::BadInteger {
                name: _,
                value: _,
                back,
            } => write!(f, "{}\n{:?}", self, back),
            Error::BadPort {
                name: _,
                value: _,
                back,
            } => write!(f, "{}\n{:?}", self, back),
            Error::BadUtf8 { source: _, back } => write!(f, "{}\n{:?}", self, back),
            Error::Format { source: _, back } => write!(f, "{}\n{:?}", self, back),
            Error::Io { source: _, back } => write!(f, "{}\n{:?}", self, back),
            Error::MissingBodySeparator { back } => write!(f, "{}\n{:?}", self, back),
            Error::MissingHeader { name: _, back } => write!(f, "{}\n{:?}", self, back),
            Error::Transport { source: _, back } => write!(f, "{}\n{:?}", self, back),
            Error::UnexpectedEof { what: _, back } => write!(f, "{}\n{:?}", self, back),
            err => write!(f, "supervisor-relay error: {}", err),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
