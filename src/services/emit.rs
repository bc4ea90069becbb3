//! Newline-delimited JSON output.

use std::io::Write;

use crate::error::Result;
use crate::models::Record;

/// Writes one compact JSON object per line.
pub struct Emitter<W: Write> {
    out: W,
    emitted: usize,
}

impl<W: Write> Emitter<W> {
    pub fn new(out: W) -> Self {
        Self { out, emitted: 0 }
    }

    /// Serialize a record and write it as a single line.
    ///
    /// The line is flushed immediately so output keeps pace with the crawl.
    pub fn emit(&mut self, record: &Record) -> Result<()> {
        let line = serde_json::to_string(record)?;
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        self.emitted += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
