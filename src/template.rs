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

//! Shared template resolution for the two formatters.
//!
//! Both the syslog & the JSON formatter are driven by a *message template* -- a format string
//! with `%(field)s`-style placeholders -- and a *date template* -- a strftime-style format
//! string consumed by [`chrono`]. [`TemplateResolver`] owns both, plus the resolved host
//! identity, and is held by value inside each formatter; the formatters call into it
//! explicitly rather than inheriting its behavior.
//!
//! The `%(hostname)s` placeholder is special: it is substituted with the host identity into
//! the message format string itself, at construction. A consequence worth noting is that
//! `hostname` is never a *template field* -- it appears in rendered syslog lines but never as
//! a key in the JSON output.

use crate::config::Config;

use chrono::{DateTime, TimeZone};
use regex::{Captures, Regex};

/// Default message template: timestamp, host, `name[pid]:`, body.
pub const DEFAULT_MESSAGE_FORMAT: &str =
    "%(asctime)s %(hostname)s %(name)s[%(process)d]: %(message)s";

/// Default date template, an ISO-8601-like local timestamp with offset.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// One `%(name)conv` placeholder: the parenthesized field name plus a conversion character.
const PLACEHOLDER_PATTERN: &str = r"%\((.+?)\)[a-zA-Z]";

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                     struct TemplateResolver                                    //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Message-template & date-template resolution, shared by both formatters.
pub struct TemplateResolver {
    /// The message format, with `%(hostname)s` already substituted.
    message_format: String,
    date_format: String,
    /// Field names referenced by the message format, in template order. Parsed once, here.
    fields: Vec<String>,
    placeholder: Regex,
}

impl TemplateResolver {
    pub fn new(config: &Config) -> TemplateResolver {
        // The pattern is a literal; it cannot fail to compile.
        let placeholder = Regex::new(PLACEHOLDER_PATTERN).unwrap();
        let message_format = config
            .message_format
            .replace("%(hostname)s", &config.hostname);
        let fields = placeholder
            .captures_iter(&message_format)
            .map(|caps| caps[1].to_string())
            .collect();
        TemplateResolver {
            message_format,
            date_format: config.date_format.clone(),
            fields,
            placeholder,
        }
    }

    /// The ordered list of field names the message template references.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Does the message template reference `name`?
    pub fn references(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field == name)
    }

    /// Render a timestamp per the date template.
    pub fn format_time<Tz: TimeZone>(&self, timestamp: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        timestamp.format(&self.date_format).to_string()
    }

    /// Substitute every placeholder in the message template via `lookup`; unresolved fields
    /// render as empty.
    pub fn render<F: FnMut(&str) -> Option<String>>(&self, mut lookup: F) -> String {
        self.placeholder
            .replace_all(&self.message_format, |caps: &Captures| {
                lookup(&caps[1]).unwrap_or_default()
            })
            .into_owned()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      hostname resolution                                       //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Resolve the host identity, once, at configuration time.
///
/// An explicit override (the `SITE_DOMAIN` key) wins, with any trailing `:port` stripped.
/// Otherwise ask the OS, falling back to a local IP address in lieu of a hostname.
pub fn resolve_hostname(site_domain: Option<&str>) -> String {
    match site_domain {
        Some(domain) => strip_port(domain).to_string(),
        None => hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .or_else(|| local_ip_address::local_ip().ok().map(|ip| ip.to_string()))
            .unwrap_or_else(|| "localhost".to_string()),
    }
}

/// Remove a trailing `:<digits>` (if any) from a host identity.
fn strip_port(domain: &str) -> &str {
    match domain.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => host,
        _ => domain,
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use chrono::FixedOffset;

    fn default_config() -> Config {
        let mut config = Config::from_lookup(|_| None).unwrap();
        config.hostname = "bree".to_string();
        config
    }

    #[test]
    fn test_field_parse_order() {
        let resolver = TemplateResolver::new(&default_config());
        let fields: Vec<&str> = resolver.fields().iter().map(String::as_str).collect();
        assert_eq!(fields, vec!["asctime", "name", "process", "message"]);
        assert!(resolver.references("asctime"));
        assert!(!resolver.references("hostname")); // substituted away
    }

    #[test]
    fn test_render() {
        let resolver = TemplateResolver::new(&default_config());
        let line = resolver.render(|field| match field {
            "asctime" => Some("2000-01-01T01:00:00+0000".to_string()),
            "name" => Some("messages".to_string()),
            "process" => Some("123".to_string()),
            "message" => Some("Test 0".to_string()),
            _ => None,
        });
        assert_eq!(line, "2000-01-01T01:00:00+0000 bree messages[123]: Test 0");
    }

    #[test]
    fn test_unresolved_fields_render_empty() {
        let mut config = default_config();
        config.message_format = "%(nosuchfield)s|%(message)s".to_string();
        let resolver = TemplateResolver::new(&config);
        let line = resolver.render(|field| match field {
            "message" => Some("hi".to_string()),
            _ => None,
        });
        assert_eq!(line, "|hi");
    }

    #[test]
    fn test_default_date_format() {
        let resolver = TemplateResolver::new(&default_config());
        let date = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2000, 1, 1, 1, 0, 0)
            .unwrap();
        assert_eq!(resolver.format_time(&date), "2000-01-01T01:00:00+0000");
    }

    #[test]
    fn test_custom_date_format() {
        let mut config = default_config();
        config.date_format = "%b %d %H:%M:%S".to_string();
        let resolver = TemplateResolver::new(&config);
        let date = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2000, 1, 1, 1, 0, 0)
            .unwrap();
        assert_eq!(resolver.format_time(&date), "Jan 01 01:00:00");
    }

    #[test]
    fn test_resolve_hostname() {
        // Two resolutions in the same process agree (the driver only ever performs one).
        assert_eq!(resolve_hostname(None), resolve_hostname(None));

        assert_eq!(resolve_hostname(Some("logs.example.com")), "logs.example.com");
        assert_eq!(resolve_hostname(Some("logs.example.com:514")), "logs.example.com");
        assert_eq!(resolve_hostname(Some("weird:port")), "weird:port");
    }
}
