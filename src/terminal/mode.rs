//! Raw-mode controller: one saved state per descriptor, restored exactly once.

use super::raw::{TerminalControl, TerminalState};
use crate::error::{Error, Result};
use std::os::unix::io::RawFd;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Enters and leaves raw or password mode on one descriptor.
///
/// The saved state is present exactly while a mode is active. Entering
/// twice or exiting without entering is an error, not a silent no-op.
pub struct RawModeController {
    control: Arc<dyn TerminalControl>,
    fd: RawFd,
    saved: Mutex<Option<TerminalState>>,
}

impl RawModeController {
    pub fn new(control: Arc<dyn TerminalControl>, fd: RawFd) -> Self {
        Self {
            control,
            fd,
            saved: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<TerminalState>> {
        self.saved.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Descriptor this controller manages.
    #[must_use]
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// True while raw or password mode is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    /// Switch to raw mode, saving the current attributes.
    pub fn enter_raw(&self) -> Result<()> {
        self.enter(TerminalState::raw, "raw")
    }

    /// Switch to password mode, saving the current attributes.
    pub fn enter_password(&self) -> Result<()> {
        self.enter(TerminalState::password, "password")
    }

    fn enter(&self, transform: fn(&TerminalState) -> TerminalState, mode: &str) -> Result<()> {
        let mut saved = self.lock();
        if saved.is_some() {
            return Err(Error::AlreadyInRawMode);
        }
        let old = self.control.get_state(self.fd)?;
        self.control.set_state(self.fd, &transform(&old))?;
        *saved = Some(old);
        tracing::debug!(fd = self.fd, mode, "entered terminal mode");
        Ok(())
    }

    /// Restore the saved attributes.
    ///
    /// When restoring fails the saved state is kept so a later call can
    /// try again.
    pub fn exit(&self) -> Result<()> {
        let mut saved = self.lock();
        let Some(old) = saved.as_ref() else {
            return Err(Error::NotInRawMode);
        };
        self.control.set_state(self.fd, old)?;
        *saved = None;
        tracing::debug!(fd = self.fd, "restored terminal mode");
        Ok(())
    }
}

impl std::fmt::Debug for RawModeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawModeController")
            .field("fd", &self.fd)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}
