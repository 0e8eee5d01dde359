use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::CookieJarConfig;
use crate::cookies::uri::CookieUri;
use crate::cookies::{Cookie, CookieFormat, CookieJar, CookieJarHandle, DefaultCookieJar};
use crate::errors::Result;

/// A `CookieJar` decorator that persists changes after each mutation.
///
/// This type is *transparent* for reads but *eagerly* persists after writes.
/// Autosave failures are logged and swallowed: the in-memory jar already holds
/// the change. Call [`flush`](Self::flush) to observe write errors.
pub struct PersistentCookieJar {
    /// Inner cookie jar that holds the actual cookie state.
    inner: DefaultCookieJar,
    /// File backing the jar. `None` keeps it in memory.
    path: Option<PathBuf>,
    /// Format of `path`.
    format: CookieFormat,
    /// Persist after every mutation.
    autosave: bool,
}

impl PersistentCookieJar {
    /// Opens the jar stored at `path`, or starts an empty one when the file
    /// does not exist yet.
    pub fn open(path: impl Into<PathBuf>, format: CookieFormat) -> Result<Self> {
        Self::from_config(&CookieJarConfig::persistent(path, format))
    }

    /// Builds a jar from `config`.
    pub fn from_config(config: &CookieJarConfig) -> Result<Self> {
        let mut inner = DefaultCookieJar::new();
        if let Some(path) = config.path.as_deref().filter(|path| path.exists()) {
            inner.load(path, config.format)?;
        }

        Ok(Self {
            inner,
            path: config.path.clone(),
            format: config.format,
            autosave: config.autosave,
        })
    }

    /// Wraps the jar in a shareable, locked handle.
    pub fn into_handle(self) -> CookieJarHandle {
        Arc::new(Mutex::new(self))
    }

    /// The in-memory jar.
    pub fn inner(&self) -> &DefaultCookieJar {
        &self.inner
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Writes the jar to its backing file now.
    pub fn flush(&mut self) -> Result<()> {
        match self.path.clone() {
            Some(path) => self.inner.save(&path, self.format),
            None => Ok(()),
        }
    }

    /// Persists after a mutation, if autosave is on.
    fn persist(&mut self) {
        if !self.autosave {
            return;
        }

        if let Err(e) = self.flush() {
            log::warn!("failed to persist cookie jar to {:?}: {e}", self.path);
        }
    }
}

impl CookieJar for PersistentCookieJar {
    /// Stores the cookie, then persists the updated state if it was accepted.
    fn add(&mut self, uri: &dyn CookieUri, cookie: Cookie) -> Option<Cookie> {
        let stored = self.inner.add(uri, cookie)?;
        self.persist();
        Some(stored)
    }

    /// Returns matching cookies without persisting.
    fn cookies_for(&mut self, uri: &dyn CookieUri) -> Vec<Cookie> {
        self.inner.cookies_for(uri)
    }

    fn all_cookies(&mut self) -> Vec<Cookie> {
        self.inner.all_cookies()
    }

    /// Clears all cookies in the jar, then persists the updated state.
    fn clear(&mut self) {
        self.inner.clear();
        self.persist();
    }

    /// Removes a single cookie by name for `uri`, then persists the updated state.
    fn remove_cookie(&mut self, uri: &dyn CookieUri, cookie_name: &str) {
        self.inner.remove_cookie(uri, cookie_name);
        self.persist();
    }

    /// Removes all cookies for `uri`, then persists the updated state.
    fn remove_cookies_for_url(&mut self, uri: &dyn CookieUri) {
        self.inner.remove_cookies_for_url(uri);
        self.persist();
    }

    fn save(&mut self, path: &Path, format: CookieFormat) -> Result<()> {
        self.inner.save(path, format)
    }

    /// Replaces the jar's contents from `path`, then persists them to the
    /// backing file.
    fn load(&mut self, path: &Path, format: CookieFormat) -> Result<()> {
        self.inner.load(path, format)?;
        self.persist();
        Ok(())
    }
}
