//! Single-slot hand-off of completed lines, and read cancellation.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// How often a waiting reader re-checks its [`CancelToken`].
const CANCEL_POLL: Duration = Duration::from_millis(20);

/// Outcome of one line read: the bytes and the condition that ended it.
///
/// A completed line has no error. When input ends, the partial line (if
/// any) comes with the error that ended it.
#[derive(Clone, Debug, Default)]
pub struct LineResult {
    pub line: Vec<u8>,
    pub error: Option<Error>,
}

impl LineResult {
    pub(crate) fn line(line: Vec<u8>) -> Self {
        Self { line, error: None }
    }

    pub(crate) fn error(error: Error) -> Self {
        Self {
            line: Vec::new(),
            error: Some(error),
        }
    }

    /// The line, or the error if there was one.
    pub fn into_result(self) -> Result<Vec<u8>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.line),
        }
    }
}

/// Holds at most one result. The newest completed line wins.
#[derive(Debug, Default)]
pub(crate) struct Mailbox {
    slot: Mutex<Option<LineResult>>,
    ready: Condvar,
}

impl Mailbox {
    fn lock(&self) -> MutexGuard<'_, Option<LineResult>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `result`, replacing one nobody picked up.
    pub(crate) fn put(&self, result: LineResult) {
        if self.lock().replace(result).is_some() {
            tracing::debug!("undelivered line replaced");
        }
        self.ready.notify_all();
    }

    /// Store `result` only if the slot is empty.
    pub(crate) fn try_put(&self, result: LineResult) -> bool {
        let mut slot = self.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(result);
        drop(slot);
        self.ready.notify_all();
        true
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    /// Block until a result arrives or `cancel` fires.
    pub(crate) fn wait(&self, cancel: &CancelToken) -> Option<LineResult> {
        let mut slot = self.lock();
        loop {
            if let Some(result) = slot.take() {
                return Some(result);
            }
            if cancel.is_cancelled() {
                return None;
            }
            slot = self
                .ready
                .wait_timeout(slot, CANCEL_POLL)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

/// Cancels a blocking read from another thread.
///
/// Clones share one flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
