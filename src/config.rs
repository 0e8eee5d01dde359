use std::path::PathBuf;

use crate::cookies::CookieFormat;

/// Cookie jar configuration. Decides where (and whether) a jar is persisted.
#[derive(Debug, Clone)]
pub struct CookieJarConfig {
    /// File the jar is loaded from and saved to. `None` keeps the jar in memory only.
    pub path: Option<PathBuf>,
    /// On-disk format of `path`
    pub format: CookieFormat,
    /// Save the jar after every mutation
    pub autosave: bool,
}

impl CookieJarConfig {
    /// Configuration for a jar backed by `path` in the given format.
    pub fn persistent(path: impl Into<PathBuf>, format: CookieFormat) -> Self {
        Self {
            path: Some(path.into()),
            format,
            ..Self::default()
        }
    }
}

impl Default for CookieJarConfig {
    fn default() -> Self {
        Self {
            path: None,
            format: CookieFormat::Json,
            autosave: true,
        }
    }
}
