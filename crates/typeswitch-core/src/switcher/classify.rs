// Typeswitch Key Classification
// Decides what an incoming key event means for the buffer

use std::collections::HashSet;

use crate::Key;

// TAB, ENTER, LEFT_CTRL, LEFT_ALT: present in the alphanumeric code range
// but they move the cursor or start shortcuts.
const EXCLUDED_CODES: &[u16] = &[15, 28, 29, 56];

/// Key codes whose events are buffered for retyping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveKeySet {
    keys: HashSet<Key>,
}

impl Default for ActiveKeySet {
    /// Every code from `1`/`!` (2) to SPACE (57), minus TAB, ENTER,
    /// LEFT_CTRL and LEFT_ALT. Shifts, space and backspace stay in.
    fn default() -> Self {
        (2..=57u16)
            .filter(|code| !EXCLUDED_CODES.contains(code))
            .map(Key::from)
            .collect()
    }
}

impl FromIterator<Key> for ActiveKeySet {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl ActiveKeySet {
    pub fn contains(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// What a key event means to the switcher.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum KeyClass {
    /// Typed text: buffered and counted
    Trackable,
    /// The configured retype key
    Trigger,
    /// Anything else: buffered text no longer matches the screen
    Reset,
}

/// Classify a key. Trackable wins over trigger if a key is both.
pub fn classify(key: Key, active_keys: &ActiveKeySet, trigger_key: Key) -> KeyClass {
    if active_keys.contains(key) {
        KeyClass::Trackable
    } else if key == trigger_key {
        KeyClass::Trigger
    } else {
        KeyClass::Reset
    }
}
