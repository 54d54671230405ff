// Typeswitch Event Sources
// Where raw key events come from, and a lazy iterator over them

use std::collections::VecDeque;

use crate::input::RawKeyEvent;

/// Result type for event loop operations
pub type EventLoopResult<T> = Result<T, EventLoopError>;

/// Errors that can occur in event loop
#[derive(Debug, thiserror::Error)]
pub enum EventLoopError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A multiplexed stream of key events from one or more devices.
pub trait EventSource {
    /// Wait up to `timeout_ms` for input and return every pending key event.
    ///
    /// `timeout_ms` of -1 waits indefinitely. An empty vector means timeout
    /// or interruption, not end of input.
    fn poll_events(&mut self, timeout_ms: i32) -> EventLoopResult<Vec<RawKeyEvent>>;

    /// True once no device is left to read from
    fn is_exhausted(&self) -> bool;

    /// Consume the source into a blocking, non-restartable iterator
    fn into_events(self) -> KeyEvents<Self>
    where
        Self: Sized,
    {
        KeyEvents::new(self)
    }
}

/// Iterator over every event of a source, in arrival order.
///
/// Blocks in `next()` until input arrives. Ends only when the source is
/// exhausted or polling fails.
pub struct KeyEvents<S: EventSource> {
    source: S,
    pending: VecDeque<RawKeyEvent>,
    finished: bool,
}

impl<S: EventSource> KeyEvents<S> {
    fn new(source: S) -> Self {
        Self {
            source,
            pending: VecDeque::new(),
            finished: false,
        }
    }
}

impl<S: EventSource> Iterator for KeyEvents<S> {
    type Item = RawKeyEvent;

    fn next(&mut self) -> Option<RawKeyEvent> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.finished || self.source.is_exhausted() {
                self.finished = true;
                return None;
            }
            match self.source.poll_events(-1) {
                Ok(events) => self.pending.extend(events),
                Err(e) => {
                    log::error!("Event polling failed: {}", e);
                    self.finished = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Key;

    struct Batches(VecDeque<Vec<RawKeyEvent>>);

    impl EventSource for Batches {
        fn poll_events(&mut self, _timeout_ms: i32) -> EventLoopResult<Vec<RawKeyEvent>> {
            Ok(self.0.pop_front().unwrap_or_default())
        }

        fn is_exhausted(&self) -> bool {
            self.0.is_empty()
        }
    }

    struct Broken;

    impl EventSource for Broken {
        fn poll_events(&mut self, _timeout_ms: i32) -> EventLoopResult<Vec<RawKeyEvent>> {
            Err(EventLoopError::Io(std::io::Error::other("poll failed")))
        }

        fn is_exhausted(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_events_flatten_batches_in_order() {
        let source = Batches(VecDeque::from(vec![
            vec![RawKeyEvent::press(Key::A), RawKeyEvent::release(Key::A)],
            vec![],
            vec![RawKeyEvent::press(Key::SPACE)],
        ]));

        let events: Vec<_> = source.into_events().collect();
        assert_eq!(
            events,
            vec![
                RawKeyEvent::press(Key::A),
                RawKeyEvent::release(Key::A),
                RawKeyEvent::press(Key::SPACE),
            ]
        );
    }

    #[test]
    fn test_events_end_on_poll_error() {
        let mut events = Broken.into_events();
        assert_eq!(events.next(), None);
        assert_eq!(events.next(), None);
    }
}
