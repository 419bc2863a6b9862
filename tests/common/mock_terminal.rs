//! Mock terminal attribute backend.
//!
//! Records every attribute change so tests can check what raw mode did to
//! the terminal and that the original state came back.

use rawline::terminal::{TerminalControl, TerminalState};
use std::io;
use std::os::unix::io::RawFd;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct State {
    current: TerminalState,
    applied: Vec<TerminalState>,
    size: Option<(u16, u16)>,
}

/// A terminal that lives in memory.
#[derive(Debug)]
pub struct MockTerminal {
    tty: bool,
    state: Mutex<State>,
}

impl MockTerminal {
    /// A terminal of `cols` x `rows` in cooked mode.
    #[must_use]
    pub fn tty(cols: u16, rows: u16) -> Self {
        Self {
            tty: true,
            state: Mutex::new(State {
                current: TerminalState::default(),
                applied: Vec::new(),
                size: Some((cols, rows)),
            }),
        }
    }

    /// Not a terminal: attribute calls fail, size is unknown.
    #[must_use]
    pub fn pipe() -> Self {
        Self {
            tty: false,
            state: Mutex::new(State {
                current: TerminalState::default(),
                applied: Vec::new(),
                size: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn resize(&self, cols: u16, rows: u16) {
        self.lock().size = Some((cols, rows));
    }

    /// Attributes currently in effect.
    #[must_use]
    pub fn current(&self) -> TerminalState {
        self.lock().current
    }

    /// Every state applied, oldest first.
    #[must_use]
    pub fn applied(&self) -> Vec<TerminalState> {
        self.lock().applied.clone()
    }
}

fn not_a_tty() -> io::Error {
    io::Error::from_raw_os_error(libc::ENOTTY)
}

impl TerminalControl for MockTerminal {
    fn get_state(&self, _fd: RawFd) -> io::Result<TerminalState> {
        if !self.tty {
            return Err(not_a_tty());
        }
        Ok(self.lock().current)
    }

    fn set_state(&self, _fd: RawFd, state: &TerminalState) -> io::Result<()> {
        if !self.tty {
            return Err(not_a_tty());
        }
        let mut inner = self.lock();
        inner.current = *state;
        inner.applied.push(*state);
        Ok(())
    }

    fn size(&self, _fd: RawFd) -> io::Result<(u16, u16)> {
        self.lock().size.ok_or_else(not_a_tty)
    }
}
