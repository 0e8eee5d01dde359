//! Cookie store infrastructure.
//!
//! A **cookie store** is the persistence layer of a cookie jar: it knows how
//! to write a [`DefaultCookieJar`] to a byte stream and how to read one back.
//! Each on-disk format has one store:
//! - [`JsonCookieStore`]: structured dump of the jar's nested
//!   `domain -> path -> name` mapping. Lossless.
//! - [`CookiesTxtStore`]: Netscape `cookies.txt`, one tab-separated line per
//!   cookie. Interoperates with browsers and `curl`, drops `HttpOnly` and
//!   sub-second expiry precision.
//!
//! Stores are selected through [`CookieFormat`], which also parses the format
//! names accepted by [`CookieJar::save_as`](crate::cookies::CookieJar::save_as).
//!
//! ## Example
//! ```rust,no_run
//! use std::path::Path;
//! use agent_cookiejar::cookies::{CookieFormat, CookieJar, DefaultCookieJar};
//!
//! let mut jar = DefaultCookieJar::new();
//! jar.save(Path::new("cookies.txt"), CookieFormat::CookiesTxt).unwrap();
//! jar.load_as(Path::new("cookies.txt"), "cookiestxt").unwrap();
//! ```
mod cookies_txt;
mod json;

use std::fmt;
use std::io::{BufRead, Write};
use std::str::FromStr;

use crate::cookies::DefaultCookieJar;
use crate::errors::{CookieJarError, Result};

/// Netscape `cookies.txt` store.
pub use cookies_txt::CookiesTxtStore;
/// Structured (JSON) dump store.
pub use json::JsonCookieStore;

/// Reads and writes whole cookie jars in one particular format.
pub trait CookieStore: Send + Sync {
    /// Serializes every cookie in `jar` to `out`.
    fn write_jar(&self, jar: &DefaultCookieJar, out: &mut dyn Write) -> Result<()>;

    /// Builds a fresh jar from `input`.
    fn read_jar(&self, input: &mut dyn BufRead) -> Result<DefaultCookieJar>;
}

/// On-disk cookie jar formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CookieFormat {
    /// Structured dump of the jar's nested mapping.
    Json,
    /// Netscape `cookies.txt`.
    CookiesTxt,
}

impl CookieFormat {
    /// The store implementing this format.
    pub fn store(self) -> &'static dyn CookieStore {
        match self {
            CookieFormat::Json => &JsonCookieStore,
            CookieFormat::CookiesTxt => &CookiesTxtStore,
        }
    }
}

impl FromStr for CookieFormat {
    type Err = CookieJarError;

    /// Accepts `json` (or `yaml`, the structured dump's historical name) and
    /// `cookiestxt` / `cookies.txt` / `netscape`, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" | "yaml" => Ok(CookieFormat::Json),
            "cookiestxt" | "cookies.txt" | "netscape" => Ok(CookieFormat::CookiesTxt),
            _ => Err(CookieJarError::InvalidArgument(format!(
                "unknown cookie jar file format: {s:?}"
            ))),
        }
    }
}

impl fmt::Display for CookieFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CookieFormat::Json => f.write_str("json"),
            CookieFormat::CookiesTxt => f.write_str("cookiestxt"),
        }
    }
}
