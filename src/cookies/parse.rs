//! `Set-Cookie` header parsing.
//!
//! Parsing is intentionally **minimal**: `Domain`, `Path`, `Expires`,
//! `Max-Age`, `Version`, `Secure` and `HttpOnly` are handled, everything
//! else is ignored. A cookie without a `Domain` attribute takes the request
//! host; one without a `Path` takes the request path.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

use crate::cookies::uri::{request_path, CookieUri};
use crate::cookies::Cookie;

/// `27-Sep-2037 00:00:00`
const DASHED_DATE: &[BorrowedFormatItem<'_>] = format_description!(
    "[day]-[month repr:short case_sensitive:false]-[year] [hour]:[minute]:[second]"
);

/// `27 Sep 2037 00:00:00`
const SPACED_DATE: &[BorrowedFormatItem<'_>] = format_description!(
    "[day] [month repr:short case_sensitive:false] [year] [hour]:[minute]:[second]"
);

impl Cookie {
    /// Parses a single `Set-Cookie` header value received for `uri`.
    ///
    /// Returns `None` when the header carries no `name=value` pair.
    pub fn parse(uri: &dyn CookieUri, header: &str) -> Option<Cookie> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Cookie::new(name, value.trim());
        let mut max_age = None;
        let mut has_path = false;

        for part in parts.map(str::trim).filter(|p| !p.is_empty()) {
            if let Some((k, v)) = part.split_once('=') {
                let v = v.trim();
                match k.trim().to_ascii_lowercase().as_str() {
                    "domain" if !v.is_empty() => cookie.domain = v.to_string(),
                    "path" if !v.is_empty() => {
                        cookie.path = v.to_string();
                        has_path = true;
                    }
                    "expires" => cookie.expires = parse_cookie_date(v),
                    "max-age" => max_age = v.parse::<i64>().ok(),
                    "version" => cookie.version = v.parse().unwrap_or(cookie.version),
                    _ => {}
                }
            } else if part.eq_ignore_ascii_case("secure") {
                cookie.secure = true;
            } else if part.eq_ignore_ascii_case("httponly") {
                cookie.http_only = true;
            }
        }

        // Max-Age wins over Expires
        if let Some(seconds) = max_age {
            cookie.expires = Some(if seconds <= 0 {
                OffsetDateTime::UNIX_EPOCH
            } else {
                OffsetDateTime::now_utc()
                    .checked_add(Duration::seconds(seconds))
                    .unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc())
            });
        }

        if cookie.domain.is_empty() {
            cookie.domain = uri.host().to_string();
        }
        if !has_path {
            cookie.path = request_path(uri).to_string();
        }

        Some(cookie)
    }
}

/// Parses an HTTP cookie date (`Sun, 27-Sep-2037 00:00:00 GMT` and the
/// space separated variant). The weekday is ignored; times are taken as UTC.
pub(crate) fn parse_cookie_date(s: &str) -> Option<OffsetDateTime> {
    let s = s.trim();
    let s = s.split_once(',').map_or(s, |(_, rest)| rest.trim());
    let s = ["GMT", "UTC"]
        .iter()
        .find_map(|zone| s.strip_suffix(zone))
        .unwrap_or(s)
        .trim();

    PrimitiveDateTime::parse(s, DASHED_DATE)
        .or_else(|_| PrimitiveDateTime::parse(s, SPACED_DATE))
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}
