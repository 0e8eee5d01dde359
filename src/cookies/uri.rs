//! Request URIs as seen by the cookie jar.
//!
//! The jar only needs the host and the path of a request. [`url::Url`]
//! implements [`CookieUri`] directly; [`HostUri`] is a host-only stand-in
//! used when cookies are reconstituted from disk and no real request exists.

use url::Url;

/// Anything that can be matched against stored cookies.
pub trait CookieUri {
    /// Host name of the request, without port.
    fn host(&self) -> &str;

    /// Request path. May be empty, in which case the jar treats it as `"/"`.
    fn path(&self) -> &str;
}

impl CookieUri for Url {
    fn host(&self) -> &str {
        self.host_str().unwrap_or_default()
    }

    fn path(&self) -> &str {
        Url::path(self)
    }
}

/// A synthetic, host-only request URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostUri {
    host: String,
}

impl HostUri {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl CookieUri for HostUri {
    fn host(&self) -> &str {
        &self.host
    }

    fn path(&self) -> &str {
        ""
    }
}

/// Request path with the empty path defaulted to `/`.
pub(crate) fn request_path(uri: &dyn CookieUri) -> &str {
    match uri.path() {
        "" => "/",
        path => path,
    }
}
