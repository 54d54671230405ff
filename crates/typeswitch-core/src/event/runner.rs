// Typeswitch Run Loop
// Wait for input, dispatch each event to the switcher, repeat

use std::sync::atomic::{AtomicBool, Ordering};

use super::source::{EventLoopError, EventSource};
use crate::output::{KeyEmitter, UInputError};
use crate::switcher::{KeyClass, Switcher};

/// Errors that end the run loop
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Input error: {0}")]
    Input(#[from] EventLoopError),

    #[error("Output error: {0}")]
    Output(#[from] UInputError),

    #[error("All input devices are gone")]
    InputExhausted,
}

/// Counters reported when the loop stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub events: u64,
    pub retypes: u64,
    pub resets: u64,
}

/// Owns the event source and the switcher and drives one from the other.
///
/// Everything happens on the calling thread. While a retype is running the
/// source is not polled.
pub struct RunLoop<S: EventSource, E: KeyEmitter> {
    source: S,
    switcher: Switcher<E>,
    poll_timeout_ms: i32,
}

impl<S: EventSource, E: KeyEmitter> RunLoop<S, E> {
    /// How often the stop flag is checked while idle
    pub const DEFAULT_POLL_TIMEOUT_MS: i32 = 100;

    pub fn new(source: S, switcher: Switcher<E>) -> Self {
        Self {
            source,
            switcher,
            poll_timeout_ms: Self::DEFAULT_POLL_TIMEOUT_MS,
        }
    }

    pub fn with_poll_timeout(mut self, timeout_ms: i32) -> Self {
        self.poll_timeout_ms = timeout_ms;
        self
    }

    /// Run until `running` is cleared, every device is gone, or output fails.
    ///
    /// Events already read when the flag is cleared are still dispatched.
    pub fn run(&mut self, running: &AtomicBool) -> Result<RunStats, RunError> {
        let mut stats = RunStats::default();

        while running.load(Ordering::SeqCst) {
            if self.source.is_exhausted() {
                return Err(RunError::InputExhausted);
            }

            for event in self.source.poll_events(self.poll_timeout_ms)? {
                stats.events += 1;
                match self.switcher.handle(event)? {
                    KeyClass::Trigger if event.action.is_released() => stats.retypes += 1,
                    KeyClass::Reset => stats.resets += 1,
                    _ => {}
                }
            }
        }

        log::debug!(
            "Run loop stopped after {} event(s), {} retype(s)",
            stats.events,
            stats.retypes
        );
        Ok(stats)
    }

    pub fn switcher(&self) -> &Switcher<E> {
        &self.switcher
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_parts(self) -> (S, Switcher<E>) {
        (self.source, self.switcher)
    }
}
