// Typeswitch Input Layer - Device Detection
// Capability analysis used to pick which devices to listen on

/// Device capabilities extracted from evdev device.capabilities()
#[derive(Debug, Clone)]
pub struct DeviceCapabilities {
    /// Whether the device supports EV_KEY events
    pub has_ev_key: bool,
    /// List of supported key codes (EV_KEY capability codes)
    pub supported_keys: Vec<u16>,
}

impl DeviceCapabilities {
    pub fn new(has_ev_key: bool, supported_keys: Vec<u16>) -> Self {
        Self {
            has_ev_key,
            supported_keys,
        }
    }

    pub fn supports_key(&self, key_code: u16) -> bool {
        self.supported_keys.contains(&key_code)
    }
}

// QWERTY row key codes: Q, W, E, R, T, Y
const QWERTY_CODES: &[u16] = &[16, 17, 18, 19, 20, 21];

// Representative A-Z and SPACE codes
const A_Z_SPACE_CODES: &[u16] = &[57, 30, 44]; // SPACE, A, Z

/// Whether a device looks like a full keyboard.
///
/// Requires EV_KEY support, the whole QWERTY row, and A, Z and SPACE.
/// Only used to annotate device listings; listening is decided by
/// [`is_key_capable`].
pub fn is_keyboard(capabilities: &DeviceCapabilities) -> bool {
    if !capabilities.has_ev_key {
        return false;
    }

    let qwerty_present = QWERTY_CODES.iter().all(|&code| capabilities.supports_key(code));
    let az_present = A_Z_SPACE_CODES.iter().all(|&code| capabilities.supports_key(code));

    qwerty_present && az_present
}

/// Whether a device can emit key or button events at all.
///
/// Mice and controllers qualify: their buttons are what resets the
/// typed-text buffer when the user clicks elsewhere.
pub fn is_key_capable(capabilities: &DeviceCapabilities) -> bool {
    capabilities.has_ev_key && !capabilities.supported_keys.is_empty()
}

/// Check if a device is our own virtual device based on its name.
///
/// Listening on it would feed every emulated key back into the buffer.
pub fn is_virtual_device(name: &str, virtual_name: &str) -> bool {
    !virtual_name.is_empty() && name.contains(virtual_name)
}
