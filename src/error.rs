//! Error types for rawline.

use std::io;
use std::sync::Arc;

/// Result type alias for rawline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for rawline operations.
///
/// Cloneable so that a fatal error recorded by the read loop can be handed
/// to every caller that asks for a line afterwards.
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    /// Raw mode was requested while this controller already holds a saved state.
    #[error("already in raw mode")]
    AlreadyInRawMode,
    /// Raw mode exit was requested without a matching enter.
    #[error("not in raw mode")]
    NotInRawMode,
    /// The user pressed the interrupt key.
    #[error("interrupted")]
    Interrupted,
    /// The input device closed, or end-of-input was typed on an empty line.
    #[error("end of input")]
    EndOfInput,
    /// A blocking read was cancelled from outside.
    #[error("cancelled")]
    Cancelled,
    /// The output device went away; further writes are pointless.
    #[error("output pipe broken")]
    BrokenPipe,
    /// Any other I/O failure from the terminal devices.
    #[error("I/O error: {0}")]
    Io(#[source] Arc<io::Error>),
}

impl Error {
    /// True for the normal-termination kinds, end-of-input and cancellation.
    #[must_use]
    pub fn is_end_of_input(&self) -> bool {
        matches!(self, Self::EndOfInput | Self::Cancelled)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::BrokenPipe => Self::BrokenPipe,
            io::ErrorKind::UnexpectedEof => Self::EndOfInput,
            _ => Self::Io(Arc::new(e)),
        }
    }
}
