//! Process-wide watcher that turns terminal signals into bus events.
//!
//! `SIGWINCH` becomes [`TerminalEvent::SizeChanged`] and `SIGPIPE` becomes
//! [`TerminalEvent::BrokenPipe`]. Signal handlers are process-global, so
//! there is one monitor per process; sessions take its bus as an explicit
//! dependency.

use crate::event::{EventBus, TerminalEvent};
use signal_hook::consts::{SIGPIPE, SIGWINCH};
use signal_hook::iterator::Signals;
use std::sync::{Arc, OnceLock};
use std::thread;

/// Owner of the signal thread and the bus it publishes on.
#[derive(Debug)]
pub struct TerminalMonitor {
    bus: Arc<EventBus>,
    listening: bool,
}

impl TerminalMonitor {
    /// The process-wide monitor, started on first use.
    ///
    /// When signal registration fails the monitor still hands out a bus; it
    /// just never publishes on it.
    pub fn global() -> &'static Self {
        static MONITOR: OnceLock<TerminalMonitor> = OnceLock::new();
        MONITOR.get_or_init(Self::start)
    }

    fn start() -> Self {
        let bus = Arc::new(EventBus::new());
        let listening = match Self::spawn_listener(Arc::clone(&bus)) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "terminal signal listener unavailable");
                false
            }
        };
        Self { bus, listening }
    }

    fn spawn_listener(bus: Arc<EventBus>) -> std::io::Result<()> {
        let mut signals = Signals::new([SIGWINCH, SIGPIPE])?;
        thread::Builder::new()
            .name("rawline-signals".to_string())
            .spawn(move || {
                for signal in signals.forever() {
                    let event = match signal {
                        SIGWINCH => TerminalEvent::SizeChanged,
                        SIGPIPE => TerminalEvent::BrokenPipe,
                        _ => continue,
                    };
                    tracing::trace!(signal, ?event, "terminal signal");
                    bus.publish(event);
                }
            })?;
        Ok(())
    }

    /// Bus carrying the signal events.
    #[must_use]
    pub fn bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    /// True when the signal thread is running.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listening
    }
}
