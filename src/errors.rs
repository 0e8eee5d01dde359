/// Errors raised by cookie jar persistence.
///
/// Rejected cookies are not errors: [`CookieJar::add`](crate::cookies::CookieJar::add)
/// returns `None` for them.
#[derive(Debug, thiserror::Error)]
pub enum CookieJarError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CookieJarError>;
