//! Cookies: [`CookieJar`], [`CookieStore`] and backends.

mod cookies;
mod cookie_jar;
mod parse;
mod persistent_cookie_jar;
mod store;
mod uri;

pub use cookies::Cookie;
pub use cookies::CookieJarHandle;

pub use cookie_jar::CookieJar;
pub use cookie_jar::DefaultCookieJar;
pub use persistent_cookie_jar::PersistentCookieJar;

pub use store::CookieFormat;
pub use store::CookieStore;
pub use store::CookiesTxtStore;
pub use store::JsonCookieStore;

pub use uri::CookieUri;
pub use uri::HostUri;
