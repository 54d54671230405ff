// Typeswitch Input Layer - Raw Key Events
// Event type checking and the event value passed through the engine

use std::fmt;

use crate::{Action, Key};

/// EV_KEY event type code from input-event-codes.h
pub const EV_KEY: u16 = 0x01;

/// Check if an event is a key event.
///
/// Key events have event.type == EV_KEY (0x01). Mouse and controller
/// buttons are key events too.
pub fn is_key_event(event_type: u16) -> bool {
    event_type == EV_KEY
}

/// Identity of the physical device an event came from.
///
/// Assigned by the event loop when the device is opened; stable for the
/// lifetime of that loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev{}", self.0)
    }
}

/// A single key event read from a physical device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawKeyEvent {
    pub key: Key,
    pub action: Action,
    pub source: DeviceId,
}

impl RawKeyEvent {
    pub fn new(key: Key, action: Action, source: DeviceId) -> Self {
        Self {
            key,
            action,
            source,
        }
    }

    /// Build an event from raw `(type, code, value)` fields.
    ///
    /// Returns `None` for non-key events and for key values the kernel
    /// never produces.
    pub fn from_raw(event_type: u16, code: u16, value: i32, source: DeviceId) -> Option<Self> {
        if !is_key_event(event_type) {
            return None;
        }
        let action = Action::from_i32(value)?;
        Some(Self::new(Key::from(code), action, source))
    }

    pub fn press(key: Key) -> Self {
        Self::new(key, Action::Press, DeviceId::default())
    }

    pub fn release(key: Key) -> Self {
        Self::new(key, Action::Release, DeviceId::default())
    }

    pub fn repeat(key: Key) -> Self {
        Self::new(key, Action::Repeat, DeviceId::default())
    }
}

impl fmt::Display for RawKeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.key, self.action, self.source)
    }
}
