//! Per-agent HTTP cookie jar.
//!
//! The jar decides which stored cookies accompany an outgoing request and
//! absorbs the cookies servers send back, enforcing RFC 2965 domain rules.
//! Jars persist to a JSON dump or to Netscape `cookies.txt`.
//!
//! ```rust
//! use agent_cookiejar::cookies::{CookieJar, DefaultCookieJar};
//! use url::Url;
//!
//! let mut jar = DefaultCookieJar::new();
//! let url = Url::parse("http://www.example.com/").unwrap();
//!
//! jar.store_set_cookie(&url, "sid=abc; domain=.example.com; path=/");
//! assert_eq!(jar.get_request_cookies(&url).as_deref(), Some("sid=abc"));
//! ```

pub mod config;
pub mod cookies;
pub mod errors;

pub use config::CookieJarConfig;
pub use errors::{CookieJarError, Result};
