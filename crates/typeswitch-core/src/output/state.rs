// Typeswitch Pressed Key State
// Keys the virtual device currently holds down

use crate::{Action, Key};
use std::collections::BTreeSet;

/// Tracks keys left pressed on the virtual device.
///
/// Replay reproduces events verbatim, so a buffer that starts mid-chord
/// (the press was evicted) or ends mid-chord can leave keys down. These are
/// released when the device closes.
#[derive(Debug, Clone, Default)]
pub struct PressedKeyState {
    pressed: BTreeSet<Key>,
}

impl PressedKeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a written key event
    pub fn apply(&mut self, key: Key, action: Action) {
        if action.is_down() {
            self.pressed.insert(key);
        } else {
            self.pressed.remove(&key);
        }
    }

    /// Remove and return every pressed key, lowest code first
    pub fn drain(&mut self) -> Vec<Key> {
        std::mem::take(&mut self.pressed).into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.pressed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty()
    }
}
