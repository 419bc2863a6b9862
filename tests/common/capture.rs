//! In-memory output devices for sessions and line buffers.
//!
//! `Capture` clones share one byte vector, so a test can hand one clone to
//! the code under test and inspect the other. `Screen` replays captured
//! bytes on a `vt100` virtual terminal.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared, growable output sink.
#[derive(Clone, Debug, Default)]
pub struct Capture {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl Capture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Everything written so far, lossily decoded.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes()).into_owned()
    }

    pub fn clear(&self) {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A writer whose reader went away.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::from(io::ErrorKind::BrokenPipe))
    }
}

/// Virtual screen fed with captured output.
pub struct Screen {
    parser: vt100::Parser,
    cols: u16,
}

impl Screen {
    #[must_use]
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            parser: vt100::Parser::new(rows, cols, 0),
            cols,
        }
    }

    /// Feed output bytes. A bare `\n` is sent as `\r\n`, the way a
    /// terminal with `ONLCR` post-processing shows it.
    pub fn feed(&mut self, bytes: &[u8]) {
        let mut translated = Vec::with_capacity(bytes.len());
        for &b in bytes {
            if b == b'\n' {
                translated.push(b'\r');
            }
            translated.push(b);
        }
        self.parser.process(&translated);
    }

    /// Visible rows with trailing blanks removed, trailing empty rows dropped.
    #[must_use]
    pub fn rows(&self) -> Vec<String> {
        let mut rows: Vec<String> = self
            .parser
            .screen()
            .rows(0, self.cols)
            .map(|row| row.trim_end().to_string())
            .collect();
        while rows.last().is_some_and(String::is_empty) {
            rows.pop();
        }
        rows
    }

    /// `(row, col)` of the cursor.
    #[must_use]
    pub fn cursor(&self) -> (u16, u16) {
        self.parser.screen().cursor_position()
    }
}
