//! Netscape `cookies.txt` cookie store.
//!
//! One cookie per line, seven tab-separated fields:
//!
//! ```text
//! domain  domain-flag  path  secure  expires  name  value
//! ```
//!
//! `domain-flag` is `TRUE` when the domain starts with a dot, `secure` is
//! `TRUE`/`FALSE`, and `expires` is in Unix seconds with `0` meaning a
//! session cookie.
//!
//! ### Reading
//! - Everything from a `#` to the end of the line is a comment.
//! - Lines that do not have exactly seven fields are skipped.
//! - Lines that are not valid UTF-8 are skipped.
//! - An expiry field that does not start with digits counts as `0`.
//! - Cookies that expired before the load are skipped.
//! - Each cookie goes through [`CookieJar::add`] with its own domain as the
//!   request host, so the domain rules hold for loaded cookies too.
//!
//! ### Writing
//! Cookies with a tab, line break or `#` in any written field cannot be read
//! back intact; they are left out with a warning.
use std::io::{BufRead, Write};

use time::OffsetDateTime;

use crate::cookies::store::CookieStore;
use crate::cookies::{Cookie, CookieJar, DefaultCookieJar, HostUri};
use crate::errors::Result;

const HEADER: &str = "# Netscape HTTP Cookie File";

/// Netscape `cookies.txt` store.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookiesTxtStore;

impl CookieStore for CookiesTxtStore {
    fn write_jar(&self, jar: &DefaultCookieJar, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "{HEADER}")?;
        for cookie in jar.iter() {
            if !is_writable(cookie) {
                log::warn!(
                    "cookies.txt: leaving out cookie {:?} for {:?}, a field contains a tab, line break or '#'",
                    cookie.name,
                    cookie.domain
                );
                continue;
            }
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                cookie.domain,
                flag(cookie.domain.starts_with('.')),
                cookie.path,
                flag(cookie.secure),
                cookie.expires.map_or(0, OffsetDateTime::unix_timestamp),
                cookie.name,
                cookie.value,
            )?;
        }
        Ok(())
    }

    fn read_jar(&self, input: &mut dyn BufRead) -> Result<DefaultCookieJar> {
        let now = OffsetDateTime::now_utc();
        let mut jar = DefaultCookieJar::new();

        for (lineno, line) in input.split(b'\n').enumerate() {
            let line = line?;
            let Ok(line) = std::str::from_utf8(&line) else {
                log::trace!("cookies.txt: skipping line {}, not UTF-8", lineno + 1);
                continue;
            };
            match parse_line(line.trim_end_matches('\r'), now) {
                Some(cookie) => {
                    let uri = HostUri::new(cookie.domain.clone());
                    jar.add(&uri, cookie);
                }
                None => log::trace!("cookies.txt: skipping line {}", lineno + 1),
            }
        }

        Ok(jar)
    }
}

/// Whether `cookie` survives a write/read cycle.
fn is_writable(cookie: &Cookie) -> bool {
    [&cookie.domain, &cookie.path, &cookie.name, &cookie.value]
        .iter()
        .all(|field| !field.contains(['\t', '\n', '\r', '#']))
}

fn flag(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

/// Parses one line. `None` for comments, malformed lines and cookies that
/// expired before `now`.
fn parse_line(line: &str, now: OffsetDateTime) -> Option<Cookie> {
    let line = line.find('#').map_or(line, |at| &line[..at]);

    let fields: Vec<&str> = line.split('\t').collect();
    let [domain, _domain_flag, path, secure, expires, name, value] = fields.as_slice() else {
        return None;
    };

    let expires = match leading_integer(expires) {
        0 => None,
        seconds => {
            let expires = OffsetDateTime::from_unix_timestamp(seconds).ok()?;
            if expires < now {
                return None;
            }
            Some(expires)
        }
    };

    Some(Cookie {
        name: name.to_string(),
        value: value.to_string(),
        domain: domain.to_string(),
        path: path.to_string(),
        expires,
        secure: *secure == "TRUE",
        http_only: false,
        version: 0,
    })
}

/// The integer at the start of `field`, `0` when there is none.
fn leading_integer(field: &str) -> i64 {
    let field = field.trim_start();
    let digits = field
        .char_indices()
        .take_while(|&(i, c)| c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+')))
        .last()
        .map_or(0, |(i, c)| i + c.len_utf8());
    field[..digits].parse().unwrap_or(0)
}
