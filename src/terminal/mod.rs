//! Terminal attributes, raw-mode control and signal monitoring.

mod mode;
mod monitor;
mod raw;

pub use mode::RawModeController;
pub use monitor::TerminalMonitor;
pub use raw::{
    TerminalControl, TerminalState, Termios, is_tty, read_password, read_password_with,
    terminal_size,
};
