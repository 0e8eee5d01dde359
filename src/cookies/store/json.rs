//! JSON-backed cookie store.
//!
//! `JsonCookieStore` writes the jar as its nested `domain -> path -> name`
//! mapping. Every attribute survives a round trip, expiry timestamps included
//! to the nanosecond. Only this crate needs to read the result back.
use std::io::{BufRead, Write};

use crate::cookies::store::CookieStore;
use crate::cookies::DefaultCookieJar;
use crate::errors::Result;

/// Structured dump of a whole cookie jar (pretty-printed JSON).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCookieStore;

impl CookieStore for JsonCookieStore {
    fn write_jar(&self, jar: &DefaultCookieJar, out: &mut dyn Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, jar)?;
        out.write_all(b"\n")?;
        Ok(())
    }

    fn read_jar(&self, input: &mut dyn BufRead) -> Result<DefaultCookieJar> {
        Ok(serde_json::from_reader(input)?)
    }
}
