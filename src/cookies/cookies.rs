//! Cookie core types.
//!
//! This module defines the serializable [`Cookie`] record and the
//! **type-erased handle** used to share a jar between threads.
//!
//! # Concurrency model
//! - [`CookieJarHandle`] is `Arc<Mutex<dyn CookieJar + Send>>`.
//!   - Every jar operation, including queries, may evict expired cookies and
//!     therefore needs the lock. There is no read-only fast path: one lock
//!     guards the whole jar.
//!
//! # Typical usage
//! ```ignore
//! let jar = DefaultCookieJar::new().into_handle();
//!
//! // Store cookies from a response
//! jar.lock().store_response_cookies(&url, &headers);
//!
//! // Acquire cookies for the next request
//! let header = jar.lock().get_request_cookies(&url);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::cookies::CookieJar;

/// A handle to a cookie jar trait.
///
/// This is a reference-counted, mutex-locked pointer to a type-erased
/// [`CookieJar`]. Lock it for every operation.
///
/// ### Example
/// ```ignore
/// let jar: CookieJarHandle = DefaultCookieJar::new().into_handle();
/// let cookies = jar.lock().cookies_for(&url);
/// jar.lock().clear();
/// ```
pub type CookieJarHandle = Arc<Mutex<dyn CookieJar + Send>>;

/// A cookie as stored/serialized by the jar.
///
/// Two cookies occupy the same jar slot when their `(domain, path, name)`
/// triples are equal; see [`Cookie::key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name (case-sensitive).
    pub name: String,

    /// Raw cookie value (not URL-decoded).
    pub value: String,

    /// Host pattern. A leading dot (`.example.com`) makes the cookie match
    /// every host ending in that domain; without it only the exact host matches.
    /// Compared case-insensitively.
    pub domain: String,

    /// Path scoping. Never empty once stored, defaults to `"/"`.
    pub path: String,

    /// Expiration timestamp. Session cookies have `None`.
    pub expires: Option<OffsetDateTime>,

    /// If `true`, cookie should only be sent over HTTPS. Carried, not enforced.
    pub secure: bool,

    /// If `true`, cookie is hidden from client-side scripts.
    pub http_only: bool,

    /// Cookie version (`0` for Netscape cookies, `1` for RFC 2965).
    pub version: u32,
}

impl Cookie {
    /// Creates a session cookie with path `/` and no domain.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
            version: 0,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_expires(mut self, expires: OffsetDateTime) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// The `(domain, path, name)` triple identifying this cookie's slot in a jar.
    /// The domain is lowercased.
    pub fn key(&self) -> (String, &str, &str) {
        (self.domain.to_ascii_lowercase(), &self.path, &self.name)
    }

    /// Returns `true` when the cookie has an expiry strictly before `now`.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires.is_some_and(|expires| expires < now)
    }

    /// Returns `true` when the cookie has already expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }
}

/// Renders the cookie as it appears in a `Cookie` request header (`name=value`).
impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}
