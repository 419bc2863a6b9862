//! Session configuration.

use crate::event::EventBus;
use crate::input::InputSource;
use crate::terminal::TerminalControl;
use std::fmt;
use std::io::Write;
use std::os::unix::io::RawFd;
use std::sync::Arc;

/// Per-rune input transform applied before dispatch.
///
/// Returns the rune to use and whether to keep it; `false` drops the input.
pub trait RuneFilter: Send + Sync {
    fn filter(&self, rune: char) -> (char, bool);
}

impl<F> RuneFilter for F
where
    F: Fn(char) -> (char, bool) + Send + Sync,
{
    fn filter(&self, rune: char) -> (char, bool) {
        self(rune)
    }
}

/// Tab completion hook.
///
/// Given the line and the cursor, returns candidate suffixes to insert at
/// the cursor, and how many runes before the cursor the candidates
/// complete (used when listing them).
pub trait AutoCompleter: Send + Sync {
    fn complete(&self, line: &[char], pos: usize) -> (Vec<Vec<char>>, usize);
}

impl<F> AutoCompleter for F
where
    F: Fn(&[char], usize) -> (Vec<Vec<char>>, usize) + Send + Sync,
{
    fn complete(&self, line: &[char], pos: usize) -> (Vec<Vec<char>>, usize) {
        self(line, pos)
    }
}

/// Options for [`Terminal::new`](super::Terminal::new).
///
/// # Example
///
/// ```
/// use rawline::session::Config;
///
/// let config = Config::default()
///     .with_prompt("\x1b[32m>\x1b[0m ")
///     .with_history_limit(100);
/// assert_eq!(config.history_limit, 100);
/// ```
pub struct Config {
    /// Prompt text; ANSI color codes are allowed.
    pub prompt: String,
    /// Render every rune as this character.
    pub mask: Option<char>,
    /// Maximum in-memory history entries; 0 disables history.
    pub history_limit: usize,
    /// Ignore ASCII case when searching history.
    pub history_search_fold: bool,
    /// Add every submitted line to history.
    pub auto_save_history: bool,
    pub rune_filter: Option<Arc<dyn RuneFilter>>,
    pub auto_complete: Option<Arc<dyn AutoCompleter>>,
    /// Render even when the input is not a terminal.
    pub force_interactive: bool,
    /// Input device; stdin when `None`.
    pub input: Option<Box<dyn InputSource>>,
    /// Output device; stdout when `None`.
    pub output: Option<Box<dyn Write + Send>>,
    /// Descriptor switched to raw mode while reading.
    pub input_fd: RawFd,
    /// Descriptors asked for the screen size, in order.
    pub screen_fds: Vec<RawFd>,
    /// Terminal attribute access; termios when `None`.
    pub control: Option<Arc<dyn TerminalControl>>,
    /// Source of resize and broken-pipe events; the process-wide signal
    /// monitor when `None`.
    pub events: Option<Arc<EventBus>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            mask: None,
            history_limit: 500,
            history_search_fold: false,
            auto_save_history: true,
            rune_filter: None,
            auto_complete: None,
            force_interactive: false,
            input: None,
            output: None,
            input_fd: libc::STDIN_FILENO,
            screen_fds: vec![libc::STDOUT_FILENO, libc::STDERR_FILENO],
            control: None,
            events: None,
        }
    }
}

impl Config {
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn with_mask(mut self, mask: char) -> Self {
        self.mask = Some(mask);
        self
    }

    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    #[must_use]
    pub fn with_history_search_fold(mut self, fold: bool) -> Self {
        self.history_search_fold = fold;
        self
    }

    #[must_use]
    pub fn with_auto_save_history(mut self, on: bool) -> Self {
        self.auto_save_history = on;
        self
    }

    #[must_use]
    pub fn with_rune_filter(mut self, filter: impl RuneFilter + 'static) -> Self {
        self.rune_filter = Some(Arc::new(filter));
        self
    }

    #[must_use]
    pub fn with_auto_complete(mut self, completer: impl AutoCompleter + 'static) -> Self {
        self.auto_complete = Some(Arc::new(completer));
        self
    }

    #[must_use]
    pub fn with_force_interactive(mut self, on: bool) -> Self {
        self.force_interactive = on;
        self
    }

    #[must_use]
    pub fn with_input(mut self, input: impl InputSource + 'static) -> Self {
        self.input = Some(Box::new(input));
        self
    }

    #[must_use]
    pub fn with_output(mut self, output: impl Write + Send + 'static) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    #[must_use]
    pub fn with_input_fd(mut self, fd: RawFd) -> Self {
        self.input_fd = fd;
        self
    }

    #[must_use]
    pub fn with_screen_fds(mut self, fds: Vec<RawFd>) -> Self {
        self.screen_fds = fds;
        self
    }

    #[must_use]
    pub fn with_control(mut self, control: Arc<dyn TerminalControl>) -> Self {
        self.control = Some(control);
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("prompt", &self.prompt)
            .field("mask", &self.mask)
            .field("history_limit", &self.history_limit)
            .field("history_search_fold", &self.history_search_fold)
            .field("auto_save_history", &self.auto_save_history)
            .field("rune_filter", &self.rune_filter.is_some())
            .field("auto_complete", &self.auto_complete.is_some())
            .field("force_interactive", &self.force_interactive)
            .field("input_fd", &self.input_fd)
            .field("screen_fds", &self.screen_fds)
            .finish_non_exhaustive()
    }
}
