use std::fmt;

/// Value carried by an `EV_KEY` event.
///
/// The kernel encodes key state as:
///   0 == released
///   1 == pressed
///   2 == autorepeat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Action {
    Release = 0,
    Press = 1,
    Repeat = 2,
}

impl Action {
    /// Returns true if this is a RELEASE event
    pub fn is_released(self) -> bool {
        matches!(self, Action::Release)
    }

    /// Returns true for PRESS and REPEAT
    pub fn is_down(self) -> bool {
        matches!(self, Action::Press | Action::Repeat)
    }

    /// Create Action from the raw event value
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(Action::Release),
            1 => Some(Action::Press),
            2 => Some(Action::Repeat),
            _ => None,
        }
    }

    /// Raw event value written to the device
    pub fn to_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Release => write!(f, "release"),
            Action::Press => write!(f, "press"),
            Action::Repeat => write!(f, "repeat"),
        }
    }
}
