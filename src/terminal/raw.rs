//! Terminal attribute capability over Unix termios.
//!
//! [`TerminalControl`] is the seam the rest of the crate uses to read and
//! write terminal attributes; [`Termios`] is the real implementation and
//! tests substitute their own.
//!
//! # Safety
//! This module uses unsafe code for FFI calls to libc termios functions.
//! These are necessary for low-level terminal control and cannot be avoided.

#![allow(unsafe_code)]
#![allow(clippy::borrow_as_ptr)]

use crate::error::{Error, Result};
use std::fmt;
use std::io;
use std::os::unix::io::{AsRawFd, RawFd};

/// Saved terminal attributes for one descriptor.
#[derive(Clone, Copy)]
pub struct TerminalState {
    termios: libc::termios,
}

impl TerminalState {
    /// Raw mode derived from this state, close to `cfmakeraw(3)`.
    ///
    /// Output post-processing stays on so `\n` still moves to column 0.
    #[must_use]
    pub fn raw(&self) -> Self {
        let mut raw = self.termios;

        // Input modes: no break, no CR to NL, no parity marks, no strip char,
        // no start/stop output control.
        raw.c_iflag &= !(libc::IGNBRK
            | libc::BRKINT
            | libc::PARMRK
            | libc::ISTRIP
            | libc::INLCR
            | libc::IGNCR
            | libc::ICRNL
            | libc::IXON);

        // Control modes: 8 bit chars, no parity
        raw.c_cflag &= !(libc::CSIZE | libc::PARENB);
        raw.c_cflag |= libc::CS8;

        // Local modes: echo off, canonical off, no extended functions,
        // no signal chars (^C, ^Z, etc)
        raw.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);

        // Blocking reads of at least one byte
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;

        Self { termios: raw }
    }

    /// Password mode: echo off, line editing and CR to NL kept.
    #[must_use]
    pub fn password(&self) -> Self {
        let mut pw = self.termios;
        pw.c_iflag &= !(libc::IGNBRK | libc::BRKINT);
        pw.c_iflag |= libc::ICRNL;
        pw.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ISIG);
        pw.c_lflag |= libc::ICANON;
        Self { termios: pw }
    }

    /// Local echo is on.
    #[must_use]
    pub fn echo(&self) -> bool {
        self.termios.c_lflag & libc::ECHO != 0
    }

    /// Canonical (line-buffered) input is on.
    #[must_use]
    pub fn canonical(&self) -> bool {
        self.termios.c_lflag & libc::ICANON != 0
    }

    /// Keyboard signal characters (^C, ^Z) are on.
    #[must_use]
    pub fn signals(&self) -> bool {
        self.termios.c_lflag & libc::ISIG != 0
    }
}

impl Default for TerminalState {
    /// A cooked-mode state: echo, canonical input and signals on.
    fn default() -> Self {
        // SAFETY: termios is plain old data; all-zero is a valid value.
        let mut termios: libc::termios = unsafe { std::mem::zeroed() };
        termios.c_iflag = libc::ICRNL | libc::IXON;
        termios.c_oflag = libc::OPOST;
        termios.c_cflag = libc::CS8;
        termios.c_lflag = libc::ECHO | libc::ICANON | libc::ISIG | libc::IEXTEN;
        Self { termios }
    }
}

impl PartialEq for TerminalState {
    fn eq(&self, other: &Self) -> bool {
        self.termios.c_iflag == other.termios.c_iflag
            && self.termios.c_oflag == other.termios.c_oflag
            && self.termios.c_cflag == other.termios.c_cflag
            && self.termios.c_lflag == other.termios.c_lflag
            && self.termios.c_cc == other.termios.c_cc
    }
}

impl fmt::Debug for TerminalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalState")
            .field("iflag", &format_args!("{:#x}", self.termios.c_iflag))
            .field("oflag", &format_args!("{:#x}", self.termios.c_oflag))
            .field("cflag", &format_args!("{:#x}", self.termios.c_cflag))
            .field("lflag", &format_args!("{:#x}", self.termios.c_lflag))
            .finish_non_exhaustive()
    }
}

/// Read and write terminal attributes of a descriptor.
pub trait TerminalControl: Send + Sync {
    fn get_state(&self, fd: RawFd) -> io::Result<TerminalState>;

    fn set_state(&self, fd: RawFd, state: &TerminalState) -> io::Result<()>;

    fn is_terminal(&self, fd: RawFd) -> bool {
        self.get_state(fd).is_ok()
    }

    /// `(cols, rows)` of the terminal behind `fd`.
    fn size(&self, fd: RawFd) -> io::Result<(u16, u16)>;
}

/// The real termios implementation.
#[derive(Clone, Copy, Debug, Default)]
pub struct Termios;

impl TerminalControl for Termios {
    fn get_state(&self, fd: RawFd) -> io::Result<TerminalState> {
        get_termios(fd).map(|termios| TerminalState { termios })
    }

    fn set_state(&self, fd: RawFd, state: &TerminalState) -> io::Result<()> {
        set_termios(fd, &state.termios)
    }

    fn size(&self, fd: RawFd) -> io::Result<(u16, u16)> {
        terminal_size(fd)
    }
}

/// Check if the given file descriptor is a TTY.
#[must_use]
pub fn is_tty<F: AsRawFd>(fd: &F) -> bool {
    // SAFETY: isatty is safe to call with any fd
    unsafe { libc::isatty(fd.as_raw_fd()) == 1 }
}

/// Get the terminal size as `(cols, rows)`.
///
/// Zero dimensions are reported as an error.
pub fn terminal_size(fd: RawFd) -> io::Result<(u16, u16)> {
    let mut size: libc::winsize = unsafe { std::mem::zeroed() };

    // SAFETY: ioctl with TIOCGWINSZ is safe when passed a valid winsize struct
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };

    if result == -1 {
        Err(io::Error::last_os_error())
    } else if size.ws_col == 0 || size.ws_row == 0 {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "terminal reported zero dimensions",
        ))
    } else {
        Ok((size.ws_col, size.ws_row))
    }
}

/// Read one line from `fd` with echo off. The trailing newline is dropped.
///
/// The previous attributes are restored before returning. Reading end of
/// file before any byte is [`Error::EndOfInput`].
pub fn read_password(fd: RawFd) -> Result<Vec<u8>> {
    read_password_with(&Termios, fd)
}

/// [`read_password`] against any [`TerminalControl`].
pub fn read_password_with(control: &dyn TerminalControl, fd: RawFd) -> Result<Vec<u8>> {
    let old = control.get_state(fd)?;
    control.set_state(fd, &old.password())?;
    let line = read_line_fd(fd);
    if let Err(err) = control.set_state(fd, &old) {
        tracing::warn!(fd, error = %err, "failed to restore terminal after password read");
    }
    line
}

fn read_line_fd(fd: RawFd) -> Result<Vec<u8>> {
    let mut chunk = [0u8; 16];
    let mut line = Vec::new();
    loop {
        // SAFETY: chunk is a valid writable buffer of the given length.
        let n = unsafe { libc::read(fd, chunk.as_mut_ptr().cast(), chunk.len()) };
        if n < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err.into());
        }
        let mut n = n.unsigned_abs();
        if n == 0 {
            if line.is_empty() {
                return Err(Error::EndOfInput);
            }
            break;
        }
        let full = n == chunk.len();
        let newline = chunk[n - 1] == b'\n';
        if newline {
            n -= 1;
        }
        line.extend_from_slice(&chunk[..n]);
        if newline || !full {
            break;
        }
    }
    Ok(line)
}

/// Get termios attributes.
fn get_termios(fd: RawFd) -> io::Result<libc::termios> {
    let mut termios: libc::termios = unsafe { std::mem::zeroed() };

    // SAFETY: tcgetattr is safe when passed a valid termios struct
    let result = unsafe { libc::tcgetattr(fd, &mut termios) };

    if result == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(termios)
    }
}

/// Set termios attributes immediately, keeping pending input.
fn set_termios(fd: RawFd, termios: &libc::termios) -> io::Result<()> {
    // SAFETY: tcsetattr is safe when passed a valid termios struct
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) };

    if result == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}
