// Typeswitch Event Buffer
// Bounded FIFO of recently typed key events, replayed on retype

use std::collections::VecDeque;

use crate::input::RawKeyEvent;

/// Default number of buffered events (~500 typed characters).
pub const DEFAULT_BUFFER_CAPACITY: usize = 1000;

/// Ordered, size-bounded sequence of key events.
///
/// Insertion order is replay order. Once full, every push evicts the oldest
/// event, so the buffer always holds the most recent `capacity` events.
#[derive(Debug, Clone)]
pub struct EventBuffer {
    events: VecDeque<RawKeyEvent>,
    capacity: usize,
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_CAPACITY)
    }
}

impl EventBuffer {
    /// Create an empty buffer. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an event, returning the evicted oldest event if the buffer was full
    pub fn push(&mut self, event: RawKeyEvent) -> Option<RawKeyEvent> {
        let evicted = if self.events.len() == self.capacity {
            self.events.pop_front()
        } else {
            None
        };
        self.events.push_back(event);
        evicted
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.events.len() == self.capacity
    }

    /// Iterate in insertion order, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &RawKeyEvent> + '_ {
        self.events.iter()
    }
}

impl<'a> IntoIterator for &'a EventBuffer {
    type Item = &'a RawKeyEvent;
    type IntoIter = std::collections::vec_deque::Iter<'a, RawKeyEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
