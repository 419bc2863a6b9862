//! Terminal session: one background reader turning keystrokes into lines.
//!
//! ```text
//!  device ─▶ ExtendedStdin ─▶ read thread ─▶ LineBuffer ─▶ output
//!                                  │
//!                                  └─▶ mailbox ─▶ Terminal::read_result
//! ```
//!
//! The read thread starts with the session and owns every edit. Callers
//! only wait on the mailbox; raw mode is held just for the duration of a
//! read. A watcher thread applies resize and broken-pipe events from the
//! [`EventBus`].
//!
//! # Example
//!
//! ```no_run
//! use rawline::session::{Config, Terminal};
//!
//! let term = Terminal::new(Config::default().with_prompt("> "))?;
//! loop {
//!     match term.read_line() {
//!         Ok(line) => println!("got {line:?}"),
//!         Err(err) if err.is_end_of_input() => break,
//!         Err(err) => return Err(err),
//!     }
//! }
//! term.close()?;
//! # Ok::<(), rawline::Error>(())
//! ```

mod config;
mod dispatch;
mod history;
mod mailbox;

pub use config::{AutoCompleter, Config, RuneFilter};
pub use history::{History, Newer, SearchHit};
pub use mailbox::{CancelToken, LineResult};

use crate::ansi::sequences::PROBE_SCREEN_SIZE;
use crate::error::{Error, Result};
use crate::event::{EventBus, TerminalEvent};
use crate::input::{ExtendedStdin, StdinWriter};
use crate::terminal::{RawModeController, TerminalControl, TerminalMonitor, Termios};
use crate::text::{LineBuffer, LineState};
use dispatch::{ReadLoop, Shared};
use mailbox::Mailbox;
use std::io::{self, Write};
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

/// First size any of `fds` reports, as `(cols, rows)`.
fn probe_size(control: &dyn TerminalControl, fds: &[RawFd]) -> Option<(u16, u16)> {
    fds.iter().find_map(|&fd| control.size(fd).ok())
}

fn join_thread(handle: Option<JoinHandle<()>>, name: &str) {
    if let Some(handle) = handle {
        if handle.join().is_err() {
            tracing::warn!(thread = name, "session thread panicked");
        }
    }
}

/// An interactive line-reading session.
///
/// Construction starts the read and watcher threads; [`close`](Self::close)
/// (or drop) stops them and restores the terminal.
pub struct Terminal {
    shared: Arc<Shared>,
    stdin: Arc<ExtendedStdin>,
    stdin_writer: StdinWriter,
    raw_mode: RawModeController,
    control: Arc<dyn TerminalControl>,
    screen_fds: Vec<RawFd>,
    events: Arc<EventBus>,
    subscription: u64,
    reader: Mutex<Option<JoinHandle<()>>>,
    watcher: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl Terminal {
    /// Start a session.
    pub fn new(config: Config) -> Result<Self> {
        let control: Arc<dyn TerminalControl> = config.control.unwrap_or_else(|| Arc::new(Termios));
        let interactive = config.force_interactive || control.is_terminal(config.input_fd);
        let screen_width = probe_size(control.as_ref(), &config.screen_fds)
            .map_or(0, |(cols, _)| usize::from(cols));

        let output = config.output.unwrap_or_else(|| Box::new(io::stdout()));
        let input = config.input.unwrap_or_else(|| Box::new(io::stdin()));
        let (stdin, stdin_writer) = ExtendedStdin::new(input)?;
        let stdin = Arc::new(stdin);

        let state = LineState::new(&config.prompt, config.mask, interactive, screen_width);
        let shared = Arc::new(Shared {
            buffer: LineBuffer::new(state, output),
            mailbox: Mailbox::default(),
            history: Mutex::new(History::new(
                config.history_limit,
                config.history_search_fold,
            )),
            fatal: Mutex::new(None),
            stop: AtomicBool::new(false),
            rune_filter: config.rune_filter,
            auto_complete: config.auto_complete,
            auto_save_history: config.auto_save_history,
        });

        let events = config
            .events
            .unwrap_or_else(|| TerminalMonitor::global().bus());
        let subscription = events.register();
        let subscription_id = subscription.id();

        let reader = {
            let shared = Arc::clone(&shared);
            let stdin = Arc::clone(&stdin);
            thread::Builder::new()
                .name("rawline-read".to_string())
                .spawn(move || ReadLoop::new(shared, stdin).run())
        };
        let reader = match reader {
            Ok(handle) => handle,
            Err(err) => {
                events.unregister(subscription_id);
                stdin.close();
                return Err(err.into());
            }
        };

        let watcher = {
            let shared = Arc::clone(&shared);
            let control = Arc::clone(&control);
            let fds = config.screen_fds.clone();
            thread::Builder::new()
                .name("rawline-events".to_string())
                .spawn(move || {
                    for event in subscription.receiver() {
                        match event {
                            TerminalEvent::SizeChanged => {
                                if let Some((cols, _)) = probe_size(control.as_ref(), &fds) {
                                    shared.buffer.set_screen_width(usize::from(cols));
                                }
                            }
                            TerminalEvent::BrokenPipe => shared.buffer.mark_output_broken(),
                        }
                    }
                })
        };
        let watcher = match watcher {
            Ok(handle) => Some(handle),
            Err(err) => {
                tracing::warn!(error = %err, "terminal event watcher unavailable");
                events.unregister(subscription_id);
                None
            }
        };

        tracing::debug!(
            interactive,
            screen_width,
            input_fd = config.input_fd,
            "terminal session started"
        );

        Ok(Self {
            shared,
            stdin,
            stdin_writer,
            raw_mode: RawModeController::new(Arc::clone(&control), config.input_fd),
            control,
            screen_fds: config.screen_fds,
            events,
            subscription: subscription_id,
            reader: Mutex::new(Some(reader)),
            watcher: Mutex::new(watcher),
            closed: AtomicBool::new(false),
        })
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    /// Block until a line is finished, input ends or `cancel` fires.
    ///
    /// A line that was finished before the read loop stopped is still
    /// delivered; after that every call reports the error that stopped it.
    /// The terminal is in raw mode only while this call waits.
    pub fn read_result(&self, cancel: &CancelToken) -> LineResult {
        if self.shared.mailbox.is_empty() {
            if let Some(err) = self.shared.fatal_error() {
                return LineResult::error(err);
            }
        }

        let raw = self.control.is_terminal(self.raw_mode.fd());
        if raw {
            if let Err(err) = self.raw_mode.enter_raw() {
                return LineResult::error(err);
            }
        }
        self.shared.buffer.refresh();

        let result = self
            .shared
            .mailbox
            .wait(cancel)
            .unwrap_or_else(|| LineResult::error(Error::Cancelled));

        if raw {
            if let Err(err) = self.raw_mode.exit() {
                tracing::warn!(error = %err, "failed to leave raw mode after read");
            }
        }
        result
    }

    /// Read one line as bytes.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        self.read_result(&CancelToken::new()).into_result()
    }

    /// Read one line as bytes, giving up when `cancel` fires.
    pub fn read_bytes_with(&self, cancel: &CancelToken) -> Result<Vec<u8>> {
        self.read_result(cancel).into_result()
    }

    /// Read one line as a string; invalid UTF-8 is replaced.
    pub fn read_string(&self) -> Result<String> {
        self.read_bytes()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Alias of [`read_string`](Self::read_string).
    pub fn read_line(&self) -> Result<String> {
        self.read_string()
    }

    // ------------------------------------------------------------------
    // Writing
    // ------------------------------------------------------------------

    /// Write bytes to the output, above the prompt if one is showing.
    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        self.shared.buffer.write_output(bytes)
    }

    /// Queue bytes to be read before any device input.
    pub fn write_stdin(&self, bytes: &[u8]) -> Result<()> {
        self.stdin_writer.clone().write_all(bytes)?;
        Ok(())
    }

    /// Writer feeding the injected-input queue.
    #[must_use]
    pub fn stdin_writer(&self) -> StdinWriter {
        self.stdin_writer.clone()
    }

    // ------------------------------------------------------------------
    // Terminal state
    // ------------------------------------------------------------------

    pub fn enter_raw_mode(&self) -> Result<()> {
        self.raw_mode.enter_raw()
    }

    pub fn exit_raw_mode(&self) -> Result<()> {
        self.raw_mode.exit()
    }

    /// `(cols, rows)` from the first screen descriptor that answers.
    pub fn get_size(&self) -> Result<(u16, u16)> {
        let mut last = None;
        for &fd in &self.screen_fds {
            match self.control.size(fd) {
                Ok(size) => return Ok(size),
                Err(err) => last = Some(err),
            }
        }
        Err(last
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no screen descriptor"))
            .into())
    }

    /// Screen columns, 0 when unknown.
    #[must_use]
    pub fn get_width(&self) -> usize {
        self.get_size().map_or(0, |(cols, _)| usize::from(cols))
    }

    /// Screen rows, 0 when unknown.
    #[must_use]
    pub fn get_height(&self) -> usize {
        self.get_size().map_or(0, |(_, rows)| usize::from(rows))
    }

    /// Ask the terminal for its size through a cursor position report.
    /// The answer arrives as input and updates the screen width.
    pub fn query_screen_size(&self) -> Result<()> {
        self.shared
            .buffer
            .write_control(PROBE_SCREEN_SIZE.as_bytes())
    }

    // ------------------------------------------------------------------
    // Line settings
    // ------------------------------------------------------------------

    pub fn set_prompt(&self, prompt: &str) {
        self.shared.buffer.set_prompt(prompt);
    }

    pub fn set_mask(&self, mask: Option<char>) {
        self.shared.buffer.set_mask(mask);
    }

    /// Append a line to the in-memory history.
    pub fn add_history(&self, line: &str) {
        let line: Vec<char> = line.chars().collect();
        self.shared.history().push(&line);
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.shared.history().len()
    }

    /// The line being edited.
    #[must_use]
    pub fn buffer(&self) -> &LineBuffer {
        &self.shared.buffer
    }

    // ------------------------------------------------------------------
    // Shutdown
    // ------------------------------------------------------------------

    /// Stop the session and restore the terminal. Later calls do nothing.
    ///
    /// Threads are joined even when restoring the terminal fails; that
    /// failure is returned.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.shared.stop.store(true, Ordering::SeqCst);
        self.stdin.close();
        join_thread(
            self.reader
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
            "read",
        );
        self.events.unregister(self.subscription);
        join_thread(
            self.watcher
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
            "events",
        );
        tracing::debug!("terminal session stopped");
        match self.raw_mode.exit() {
            Ok(()) | Err(Error::NotInRawMode) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!(error = %err, "terminal close failed");
        }
    }
}

impl std::fmt::Debug for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terminal")
            .field("buffer", &self.shared.buffer)
            .field("raw_mode", &self.raw_mode.is_active())
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
