//! Cookie jar abstraction and a simple in-memory implementation.
//!
//! A **cookie jar** represents all cookies belonging to a single agent. The
//! caller hands every cookie a server sets to [`CookieJar::add`] and asks
//! [`CookieJar::cookies_for`] which ones to send before the next request.
//!
//! This module defines the [`CookieJar`] trait and a reference implementation,
//! [`DefaultCookieJar`], which indexes cookies by domain, path and name.
//!
//! ## Matching rules
//! - **Setting** (RFC 2965): the cookie domain must contain an embedded dot
//!   (`localhost` and `.local` names excepted) and must occur in the request
//!   host with no dotted label in front of it. `x.foo.com` may set
//!   `.foo.com`, `y.x.foo.com` may not.
//! - **Sending**: a stored domain with a leading dot matches every host that
//!   ends with it; any other domain matches only the identical host. Paths
//!   match as plain string prefixes, so `/login` also matches `/loginx`.
//! - Expired cookies are evicted before every query and are never returned.
//!
//! ## Notes & limitations
//! - `Secure` and `HttpOnly` are carried but not enforced.
//! - This module is **not** internally synchronized. Use it via a
//!   [`CookieJarHandle`] when sharing between threads.
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use http::HeaderMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;

use crate::cookies::uri::{request_path, CookieUri};
use crate::cookies::{Cookie, CookieFormat, CookieJarHandle, CookieStore};
use crate::errors::Result;

/// A cookie jar keeps the cookies for one single agent.
///
/// Every operation takes `&mut self`: queries evict expired cookies as a side
/// effect.
pub trait CookieJar: Send {
    /// Stores `cookie`, received in a response to `uri`.
    ///
    /// Returns the stored cookie, or `None` when the cookie's domain may not be
    /// set from `uri`. Rejection is silent by design: misbehaving servers are
    /// ignored, not reported.
    fn add(&mut self, uri: &dyn CookieUri, cookie: Cookie) -> Option<Cookie>;

    /// Returns every unexpired cookie that should be sent with a request to `uri`.
    fn cookies_for(&mut self, uri: &dyn CookieUri) -> Vec<Cookie>;

    /// Returns `true` when no cookie would be sent to `uri`.
    fn is_empty_for(&mut self, uri: &dyn CookieUri) -> bool {
        self.cookies_for(uri).is_empty()
    }

    /// Returns every unexpired cookie in the jar.
    fn all_cookies(&mut self) -> Vec<Cookie>;

    /// Removes all cookies from the jar.
    fn clear(&mut self);

    /// Removes every cookie named `cookie_name` that would be sent to `uri`.
    fn remove_cookie(&mut self, uri: &dyn CookieUri, cookie_name: &str);

    /// Removes every cookie that would be sent to `uri`.
    fn remove_cookies_for_url(&mut self, uri: &dyn CookieUri);

    /// Writes the jar to `path` in `format`.
    fn save(&mut self, path: &Path, format: CookieFormat) -> Result<()>;

    /// Replaces the jar's contents with the cookies stored at `path`.
    ///
    /// On failure the jar is left untouched.
    fn load(&mut self, path: &Path, format: CookieFormat) -> Result<()>;

    /// Like [`save`](Self::save), with the format given by name
    /// (see [`CookieFormat`]'s `FromStr`). Unknown names fail before `path` is touched.
    fn save_as(&mut self, path: &Path, format: &str) -> Result<()> {
        let format = format.parse::<CookieFormat>()?;
        self.save(path, format)
    }

    /// Like [`load`](Self::load), with the format given by name.
    fn load_as(&mut self, path: &Path, format: &str) -> Result<()> {
        let format = format.parse::<CookieFormat>()?;
        self.load(path, format)
    }

    /// Parses one `Set-Cookie` header value and stores the result.
    ///
    /// Also used for cookies set by `<meta http-equiv="Set-Cookie">` directives.
    fn store_set_cookie(&mut self, uri: &dyn CookieUri, header: &str) -> Option<Cookie> {
        let cookie = Cookie::parse(uri, header)?;
        self.add(uri, cookie)
    }

    /// Stores cookies found in response `headers` for the given `url`.
    ///
    /// Returns the number of cookies accepted.
    fn store_response_cookies(&mut self, url: &Url, headers: &HeaderMap) -> usize {
        headers
            .get_all(http::header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| self.store_set_cookie(url, value))
            .count()
    }

    /// Returns the `Cookie` request header value to send for `uri`, if any.
    fn get_request_cookies(&mut self, uri: &dyn CookieUri) -> Option<String> {
        let header = self
            .cookies_for(uri)
            .iter()
            .map(Cookie::to_string)
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            None
        } else {
            Some(header)
        }
    }
}

type NameMap = BTreeMap<String, Cookie>;
type PathMap = BTreeMap<String, NameMap>;

/// Default cookie jar.
///
/// Cookies are indexed `domain -> path -> name`, where the domain key is the
/// cookie's own (lowercased) domain attribute. A cookie with the same triple
/// replaces the previous one. Serializes as that nested mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefaultCookieJar {
    entries: BTreeMap<String, PathMap>,
}

impl DefaultCookieJar {
    /// Creates an empty in-memory cookie jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps the jar in a shareable, locked handle.
    pub fn into_handle(self) -> CookieJarHandle {
        Arc::new(Mutex::new(self))
    }

    /// Number of unexpired cookies, i.e. what would remain after a cleanup.
    pub fn len(&self) -> usize {
        let now = OffsetDateTime::now_utc();
        self.iter().filter(|cookie| !cookie.is_expired_at(now)).count()
    }

    /// Returns `true` when the jar holds no unexpired cookie for any request.
    /// See [`CookieJar::is_empty_for`] for a per-request check.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over every stored cookie without evicting anything.
    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.entries
            .values()
            .flat_map(|paths| paths.values())
            .flat_map(|names| names.values())
    }

    /// Removes every cookie that expired before now.
    pub fn cleanup(&mut self) {
        self.cleanup_at(OffsetDateTime::now_utc());
    }

    fn cleanup_at(&mut self, now: OffsetDateTime) {
        let before = self.iter().count();
        for names in self.entries.values_mut().flat_map(|paths| paths.values_mut()) {
            names.retain(|_, cookie| !cookie.is_expired_at(now));
        }
        self.prune();

        let evicted = before - self.iter().count();
        if evicted > 0 {
            log::trace!("evicted {evicted} expired cookie(s)");
        }
    }

    /// Drops empty path and domain buckets.
    fn prune(&mut self) {
        for paths in self.entries.values_mut() {
            paths.retain(|_, names| !names.is_empty());
        }
        self.entries.retain(|_, paths| !paths.is_empty());
    }

    fn matching<'a>(&'a self, uri: &'a dyn CookieUri) -> impl Iterator<Item = &'a Cookie> + 'a {
        let host = uri.host();
        let path = request_path(uri);

        self.entries
            .iter()
            .filter(move |(domain, _)| domain_matches(host, domain))
            .flat_map(move |(_, paths)| {
                paths
                    .iter()
                    .filter(move |(prefix, _)| path.starts_with(prefix.as_str()))
                    .flat_map(|(_, names)| names.values())
            })
    }

    fn retain_matching(&mut self, uri: &dyn CookieUri, mut keep: impl FnMut(&Cookie) -> bool) {
        let host = uri.host();
        let path = request_path(uri);

        for (_, paths) in self.entries.iter_mut().filter(|(domain, _)| domain_matches(host, domain)) {
            for (_, names) in paths.iter_mut().filter(|(prefix, _)| path.starts_with(prefix.as_str())) {
                names.retain(|_, cookie| keep(&*cookie));
            }
        }
        self.prune();
    }
}

impl CookieJar for DefaultCookieJar {
    fn add(&mut self, uri: &dyn CookieUri, mut cookie: Cookie) -> Option<Cookie> {
        if !valid_cookie_for_uri(uri, &cookie) {
            log::debug!(
                "rejected cookie {:?} for domain {:?} from host {:?}",
                cookie.name,
                cookie.domain,
                uri.host()
            );
            return None;
        }

        if cookie.path.is_empty() {
            cookie.path = "/".to_string();
        }

        let (domain, path, name) = cookie.key();
        self.entries
            .entry(domain)
            .or_default()
            .entry(path.to_string())
            .or_default()
            .insert(name.to_string(), cookie.clone());

        Some(cookie)
    }

    fn cookies_for(&mut self, uri: &dyn CookieUri) -> Vec<Cookie> {
        let now = OffsetDateTime::now_utc();
        self.cleanup_at(now);

        self.matching(uri)
            .filter(|cookie| !cookie.is_expired_at(now))
            .cloned()
            .collect()
    }

    fn all_cookies(&mut self) -> Vec<Cookie> {
        self.cleanup();
        self.iter().cloned().collect()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn remove_cookie(&mut self, uri: &dyn CookieUri, cookie_name: &str) {
        self.retain_matching(uri, |cookie| cookie.name != cookie_name);
    }

    fn remove_cookies_for_url(&mut self, uri: &dyn CookieUri) {
        self.retain_matching(uri, |_| false);
    }

    fn save(&mut self, path: &Path, format: CookieFormat) -> Result<()> {
        self.cleanup();

        let mut out = BufWriter::new(File::create(path)?);
        format.store().write_jar(self, &mut out)?;
        out.flush()?;

        log::debug!("saved {} cookie(s) to {} as {format}", self.len(), path.display());
        Ok(())
    }

    fn load(&mut self, path: &Path, format: CookieFormat) -> Result<()> {
        let mut input = BufReader::new(File::open(path)?);
        let mut jar = format.store().read_jar(&mut input)?;
        jar.cleanup();
        *self = jar;

        log::debug!("loaded {} cookie(s) from {} as {format}", self.len(), path.display());
        Ok(())
    }
}

/// Removes a trailing `:port` from a host or cookie domain.
fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}

/// A dot with at least one character on either side.
fn has_embedded_dot(s: &str) -> bool {
    s.char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < s.len())
}

/// `localhost` and `.local` names, with an optional trailing dot.
fn is_local_domain(domain: &str) -> bool {
    let domain = domain.to_ascii_lowercase();
    let domain = domain.strip_suffix('.').unwrap_or(&domain);
    domain.ends_with("localhost") || domain.ends_with("local")
}

/// RFC 2965 rules for whether `uri` may set `cookie`.
///
/// Permitted: request-host `x.foo.com` setting Domain=`.foo.com`.
/// Not permitted: `y.x.foo.com` setting `.foo.com` (`y.x` contains a dot),
/// nor `foo.com` setting `.bar.com`.
fn valid_cookie_for_uri(uri: &dyn CookieUri, cookie: &Cookie) -> bool {
    let domain = strip_port(&cookie.domain);

    if !has_embedded_dot(domain) && !is_local_domain(domain) {
        return false;
    }

    let host = uri.host().to_ascii_lowercase();
    match host.find(&domain.to_ascii_lowercase()) {
        Some(at) => !has_embedded_dot(&host[..at]),
        None => false,
    }
}

/// Whether the stored `domain` key applies to requests for `host`.
fn domain_matches(host: &str, domain: &str) -> bool {
    let domain = strip_port(domain);
    if domain.starts_with('.') {
        let (host, domain) = (host.as_bytes(), domain.as_bytes());
        host.len() >= domain.len() && host[host.len() - domain.len()..].eq_ignore_ascii_case(domain)
    } else {
        host.eq_ignore_ascii_case(domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::HostUri;
    use time::Duration;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn cookie(name: &str, value: &str, domain: &str) -> Cookie {
        Cookie::new(name, value).with_domain(domain)
    }

    fn names(mut cookies: Vec<Cookie>) -> Vec<String> {
        cookies.sort_by(|a, b| a.name.cmp(&b.name));
        cookies.into_iter().map(|c| c.name).collect()
    }

    #[test]
    fn dotted_domain_matches_subdomains_only() {
        let mut jar = DefaultCookieJar::new();
        assert!(jar.add(&url("http://www.example.com/"), cookie("a", "1", ".example.com")).is_some());

        assert_eq!(jar.cookies_for(&url("http://host.example.com/")).len(), 1);
        assert_eq!(jar.cookies_for(&url("http://deep.host.example.com/")).len(), 1);
        assert!(jar.cookies_for(&url("http://example.com/")).is_empty());
        assert!(jar.cookies_for(&url("http://example.org/")).is_empty());
    }

    #[test]
    fn plain_domain_requires_exact_host() {
        let mut jar = DefaultCookieJar::new();
        assert!(jar.add(&url("http://example.com/"), cookie("a", "1", "example.com")).is_some());

        assert_eq!(jar.cookies_for(&url("http://EXAMPLE.com/")).len(), 1);
        assert!(jar.cookies_for(&url("http://www.example.com/")).is_empty());
    }

    #[test]
    fn domain_matching_is_case_insensitive() {
        let mut jar = DefaultCookieJar::new();
        let stored = jar.add(&url("http://www.example.com/"), cookie("a", "1", ".Example.COM"));
        assert_eq!(stored.unwrap().domain, ".Example.COM");

        assert_eq!(jar.cookies_for(&HostUri::new("WWW.EXAMPLE.COM")).len(), 1);
    }

    #[test]
    fn anti_leak_rule() {
        let mut jar = DefaultCookieJar::new();
        assert!(jar.add(&url("http://y.x.foo.com/"), cookie("a", "1", ".foo.com")).is_none());
        assert!(jar.add(&url("http://bar.com/"), cookie("a", "1", ".foo.com")).is_none());
        assert!(jar.all_cookies().is_empty());

        assert!(jar.add(&url("http://x.foo.com/"), cookie("a", "1", ".foo.com")).is_some());
        assert_eq!(jar.all_cookies().len(), 1);
    }

    #[test]
    fn embedded_dot_rule() {
        let mut jar = DefaultCookieJar::new();
        assert!(jar.add(&HostUri::new("com"), cookie("a", "1", "com")).is_none());
        assert!(jar.add(&url("http://foo.com/"), cookie("a", "1", "com")).is_none());
        assert!(jar.add(&url("http://foo.com/"), cookie("a", "1", ".com")).is_none());
        assert!(jar.add(&url("http://foo.com/"), cookie("a", "1", "")).is_none());

        assert!(jar.add(&url("http://localhost/"), cookie("a", "1", "localhost")).is_some());
        assert!(jar.add(&url("http://printer.local/"), cookie("b", "1", "printer.local")).is_some());
        assert!(jar.add(&url("http://printer.local/"), cookie("c", "1", ".local")).is_some());
        assert_eq!(jar.cookies_for(&url("http://localhost/")).len(), 1);
    }

    #[test]
    fn port_is_stripped_from_cookie_domain() {
        let mut jar = DefaultCookieJar::new();
        assert!(jar.add(&url("http://localhost:3000/"), cookie("a", "1", "localhost:3000")).is_some());
        assert_eq!(jar.cookies_for(&url("http://localhost:3000/")).len(), 1);
    }

    #[test]
    fn path_is_a_raw_string_prefix() {
        let mut jar = DefaultCookieJar::new();
        let c = cookie("a", "1", "example.com").with_path("/login");
        jar.add(&url("http://example.com/login"), c);

        assert_eq!(jar.cookies_for(&url("http://example.com/login")).len(), 1);
        assert_eq!(jar.cookies_for(&url("http://example.com/login/submit")).len(), 1);
        assert_eq!(jar.cookies_for(&url("http://example.com/loginx")).len(), 1);
        assert!(jar.cookies_for(&url("http://example.com/")).is_empty());
        assert!(jar.cookies_for(&url("http://example.com/Login")).is_empty());
    }

    #[test]
    fn empty_request_path_defaults_to_root() {
        let mut jar = DefaultCookieJar::new();
        jar.add(&url("http://example.com/"), cookie("a", "1", "example.com"));
        assert_eq!(jar.cookies_for(&HostUri::new("example.com")).len(), 1);
    }

    #[test]
    fn same_triple_is_upserted() {
        let mut jar = DefaultCookieJar::new();
        let u = url("http://example.com/");
        jar.add(&u, cookie("a", "old", "example.com"));
        jar.add(&u, cookie("a", "new", "EXAMPLE.com"));

        let all = jar.all_cookies();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].value, "new");
    }

    #[test]
    fn upsert_keeps_the_latest_domain_spelling() {
        let mut jar = DefaultCookieJar::new();
        let u = url("http://www.example.com/");
        jar.add(&u, cookie("a", "old", ".Example.COM"));
        jar.add(&u, cookie("a", "new", ".example.com"));

        assert_eq!(jar.iter().count(), 1);
        let stored = jar.iter().next().unwrap();
        assert_eq!(stored.value, "new");
        assert_eq!(stored.domain, ".example.com");
        assert_eq!(jar.cookies_for(&url("http://WWW.EXAMPLE.COM/")).len(), 1);
    }

    #[test]
    fn len_ignores_expired_cookies_before_cleanup() {
        let mut jar = DefaultCookieJar::new();
        let u = url("http://example.com/");
        let past = OffsetDateTime::now_utc() - Duration::seconds(1);
        jar.add(&u, cookie("gone", "v", "example.com").with_expires(past));

        assert_eq!(jar.iter().count(), 1);
        assert_eq!(jar.len(), 0);
        assert!(jar.is_empty());

        jar.add(&u, cookie("live", "v", "example.com"));
        assert_eq!(jar.len(), 1);
        assert!(!jar.is_empty());

        jar.cleanup();
        assert_eq!(jar.iter().count(), 1);
    }

    #[test]
    fn same_name_on_different_paths_coexists() {
        let mut jar = DefaultCookieJar::new();
        let u = url("http://example.com/a/b");
        jar.add(&u, cookie("a", "root", "example.com"));
        jar.add(&u, cookie("a", "deep", "example.com").with_path("/a"));

        assert_eq!(jar.all_cookies().len(), 2);
        assert_eq!(jar.cookies_for(&u).len(), 2);
        assert_eq!(jar.cookies_for(&url("http://example.com/b")).len(), 1);
    }

    #[test]
    fn expired_cookies_are_never_returned() {
        let mut jar = DefaultCookieJar::new();
        let u = url("http://example.com/");
        let past = OffsetDateTime::now_utc() - Duration::seconds(1);
        let future = OffsetDateTime::now_utc() + Duration::hours(1);

        assert!(jar.add(&u, cookie("old", "1", "example.com").with_expires(past)).is_some());
        jar.add(&u, cookie("fresh", "1", "example.com").with_expires(future));

        assert_eq!(names(jar.cookies_for(&u)), vec!["fresh"]);
        assert_eq!(names(jar.all_cookies()), vec!["fresh"]);
        assert_eq!(jar.len(), 1);
    }

    #[test]
    fn cleanup_prunes_empty_buckets() {
        let mut jar = DefaultCookieJar::new();
        let past = OffsetDateTime::now_utc() - Duration::seconds(1);
        jar.add(&url("http://example.com/"), cookie("old", "1", "example.com").with_expires(past));

        assert!(!jar.entries.is_empty());
        jar.cleanup();
        jar.cleanup();
        assert!(jar.entries.is_empty());
    }

    #[test]
    fn is_empty_for_follows_cookies_for() {
        let mut jar = DefaultCookieJar::new();
        let u = url("http://example.com/");
        assert!(jar.is_empty_for(&u));

        jar.add(&u, cookie("a", "1", "example.com"));
        assert!(!jar.is_empty_for(&u));
        assert!(jar.is_empty_for(&url("http://other.com/")));
    }

    #[test]
    fn results_contain_no_duplicates_or_strangers() {
        let mut jar = DefaultCookieJar::new();
        jar.add(&url("http://www.example.com/"), cookie("a", "1", ".example.com"));
        jar.add(&url("http://www.example.com/"), cookie("b", "1", "www.example.com"));
        jar.add(&url("http://other.com/"), cookie("c", "1", "other.com"));

        assert_eq!(names(jar.cookies_for(&url("http://www.example.com/"))), vec!["a", "b"]);
    }

    #[test]
    fn clear_empties_jar() {
        let mut jar = DefaultCookieJar::new();
        let u = url("http://example.com/");
        jar.add(&u, cookie("a", "1", "example.com"));
        jar.clear();
        assert!(jar.cookies_for(&u).is_empty());
        assert!(jar.all_cookies().is_empty());
    }

    #[test]
    fn remove_cookie_only_touches_matching_scope() {
        let mut jar = DefaultCookieJar::new();
        jar.add(&url("http://example.com/"), cookie("a", "1", "example.com"));
        jar.add(&url("http://example.com/"), cookie("b", "1", "example.com"));
        jar.add(&url("http://other.com/"), cookie("a", "1", "other.com"));

        jar.remove_cookie(&url("http://example.com/"), "a");
        assert_eq!(names(jar.all_cookies()), vec!["a", "b"]);
        assert_eq!(names(jar.cookies_for(&url("http://example.com/"))), vec!["b"]);

        jar.remove_cookies_for_url(&url("http://example.com/"));
        assert_eq!(jar.all_cookies().len(), 1);
        assert_eq!(jar.all_cookies()[0].domain, "other.com");
    }

    #[test]
    fn request_header_joins_pairs() {
        let mut jar = DefaultCookieJar::new();
        let u = url("http://www.example.com/");
        assert_eq!(jar.get_request_cookies(&u), None);

        jar.store_set_cookie(&u, "a=b; domain=.example.com");
        jar.store_set_cookie(&u, "c=d; domain=.example.com");
        assert_eq!(jar.get_request_cookies(&u).as_deref(), Some("a=b; c=d"));
    }

    #[test]
    fn stores_set_cookie_response_headers() {
        let mut jar = DefaultCookieJar::new();
        let u = url("http://www.example.com/");
        let mut headers = HeaderMap::new();
        headers.append(http::header::SET_COOKIE, "a=b; domain=.example.com".parse().unwrap());
        headers.append(http::header::SET_COOKIE, "c=d; domain=.evil.com".parse().unwrap());
        headers.append(http::header::CONTENT_TYPE, "text/html".parse().unwrap());

        assert_eq!(jar.store_response_cookies(&u, &headers), 1);
        assert_eq!(names(jar.cookies_for(&u)), vec!["a"]);
    }

    #[test]
    fn strip_port_only_removes_numeric_suffix() {
        assert_eq!(strip_port("example.com:8080"), "example.com");
        assert_eq!(strip_port("example.com"), "example.com");
        assert_eq!(strip_port("example.com:"), "example.com:");
        assert_eq!(strip_port("example.com:abc"), "example.com:abc");
    }

    #[test]
    fn embedded_dot_needs_a_character_on_both_sides() {
        assert!(has_embedded_dot("example.com"));
        assert!(has_embedded_dot(".example.com"));
        assert!(!has_embedded_dot(".com"));
        assert!(!has_embedded_dot("com."));
        assert!(!has_embedded_dot("www."));
        assert!(!has_embedded_dot(""));
    }
}
