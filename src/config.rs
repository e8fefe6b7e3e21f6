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

//! Runtime configuration.
//!
//! All knobs arrive through environment-style keys, resolved exactly once at startup into a
//! [`Config`] value that is then passed to constructors -- no component consults the process
//! environment (or any other global) after this point, and tests can build a [`Config`] from
//! an arbitrary lookup closure instead of mutating the shared environment.
//!
//! | Key                   | Effect                                     | Default           |
//! |-----------------------|--------------------------------------------|-------------------|
//! | `SUPERVISOR_LOG_TYPE` | `syslog` \| `tcp_json` \| other -> no-op   | `syslog`          |
//! | `SYSLOG_SERVER`       | syslog target host                         | `127.0.0.1`       |
//! | `SYSLOG_PORT`         | syslog target port                         | `514`             |
//! | `SYSLOG_PROTO`        | `udp` \| other -> stream                   | `udp`             |
//! | `TCP_SERVER`          | JSON sink target host                      | `127.0.0.1`       |
//! | `TCP_PORT`            | JSON sink target port                      | `5565`            |
//! | `MESSAGE_FORMAT`      | message template override                  | built-in default  |
//! | `DATE_FORMAT`         | date template override                     | built-in default  |
//! | `SITE_DOMAIN`         | host identity override (`:port` stripped)  | resolved from OS  |

use crate::{
    error::{Error, Result},
    template,
};

use backtrace::Backtrace;

pub const DEFAULT_SYSLOG_PORT: u16 = 514;
pub const DEFAULT_TCP_JSON_PORT: u16 = 5565;

/// Which sink handler to build. Anything other than the two recognized keywords deliberately
/// selects no handler at all: the process stays up but relays nothing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SinkType {
    Syslog,
    TcpJson,
    Disabled,
}

/// Transport for the syslog sink. Mirroring the sink's convention, `udp` selects datagrams &
/// any other value selects a stream.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SyslogProto {
    Udp,
    Stream,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub sink: SinkType,
    pub syslog_host: String,
    pub syslog_port: u16,
    pub syslog_proto: SyslogProto,
    pub tcp_host: String,
    pub tcp_port: u16,
    pub message_format: String,
    pub date_format: String,
    /// Host identity, resolved once here & cached for the life of the process.
    pub hostname: String,
}

impl Config {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Config> {
        let sink = match lookup("SUPERVISOR_LOG_TYPE").as_deref() {
            None | Some("syslog") => SinkType::Syslog,
            Some("tcp_json") => SinkType::TcpJson,
            Some(_) => SinkType::Disabled,
        };
        let syslog_proto = match lookup("SYSLOG_PROTO").as_deref() {
            None | Some("udp") => SyslogProto::Udp,
            Some(_) => SyslogProto::Stream,
        };
        Ok(Config {
            sink,
            syslog_host: lookup("SYSLOG_SERVER").unwrap_or_else(|| "127.0.0.1".to_string()),
            syslog_port: parse_port("SYSLOG_PORT", lookup("SYSLOG_PORT"), DEFAULT_SYSLOG_PORT)?,
            syslog_proto,
            tcp_host: lookup("TCP_SERVER").unwrap_or_else(|| "127.0.0.1".to_string()),
            tcp_port: parse_port("TCP_PORT", lookup("TCP_PORT"), DEFAULT_TCP_JSON_PORT)?,
            message_format: lookup("MESSAGE_FORMAT")
                .unwrap_or_else(|| template::DEFAULT_MESSAGE_FORMAT.to_string()),
            date_format: lookup("DATE_FORMAT")
                .unwrap_or_else(|| template::DEFAULT_DATE_FORMAT.to_string()),
            hostname: template::resolve_hostname(lookup("SITE_DOMAIN").as_deref()),
        })
    }
}

fn parse_port(name: &'static str, value: Option<String>, default: u16) -> Result<u16> {
    match value {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| Error::BadPort {
            name,
            value,
            back: Backtrace::new(),
        }),
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.sink, SinkType::Syslog);
        assert_eq!(config.syslog_host, "127.0.0.1");
        assert_eq!(config.syslog_port, 514);
        assert_eq!(config.syslog_proto, SyslogProto::Udp);
        assert_eq!(config.tcp_host, "127.0.0.1");
        assert_eq!(config.tcp_port, 5565);
        assert_eq!(config.message_format, template::DEFAULT_MESSAGE_FORMAT);
        assert_eq!(config.date_format, template::DEFAULT_DATE_FORMAT);
        assert!(!config.hostname.is_empty());
    }

    #[test]
    fn test_sink_selection() {
        let lookup = |value: &'static str| {
            move |key: &str| (key == "SUPERVISOR_LOG_TYPE").then(|| value.to_string())
        };
        assert_eq!(
            Config::from_lookup(lookup("syslog")).unwrap().sink,
            SinkType::Syslog
        );
        assert_eq!(
            Config::from_lookup(lookup("tcp_json")).unwrap().sink,
            SinkType::TcpJson
        );
        assert_eq!(
            Config::from_lookup(lookup("journald")).unwrap().sink,
            SinkType::Disabled
        );
    }

    #[test]
    fn test_syslog_proto() {
        let config = Config::from_lookup(|key| {
            (key == "SYSLOG_PROTO").then(|| "tcp".to_string())
        })
        .unwrap();
        assert_eq!(config.syslog_proto, SyslogProto::Stream);
    }

    #[test]
    fn test_bad_port_is_fatal() {
        let result = Config::from_lookup(|key| {
            (key == "SYSLOG_PORT").then(|| "fivefourteen".to_string())
        });
        assert!(matches!(
            result,
            Err(Error::BadPort {
                name: "SYSLOG_PORT",
                ..
            })
        ));
    }

    #[test]
    fn test_site_domain_override() {
        let config = Config::from_lookup(|key| {
            (key == "SITE_DOMAIN").then(|| "logs.example.com:8443".to_string())
        })
        .unwrap();
        assert_eq!(config.hostname, "logs.example.com");
    }
}
