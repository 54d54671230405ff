// Typeswitch uinput Output Layer
// Virtual device creation and key event emission

use super::state::PressedKeyState;
use super::{KeyEmitter, UInputError, VIRTUAL_DEVICE_NAME};
use crate::{Action, Key};

use evdev::{EventType, InputEvent};

/// Virtual uinput keyboard used to delete, switch layout and retype.
///
/// Writes are queued and flushed as one batch per `sync()`; the batch is
/// terminated with `SYN_REPORT`. Keys still held when the device is closed
/// or dropped are released first.
pub struct VirtualDevice {
    device: evdev::uinput::VirtualDevice,
    pending: Vec<InputEvent>,
    pressed_keys: PressedKeyState,
}

impl VirtualDevice {
    /// Create the virtual device under the default name
    pub fn new() -> Result<Self, UInputError> {
        Self::with_name(VIRTUAL_DEVICE_NAME)
    }

    /// Create the virtual device under a custom name.
    ///
    /// The event loop recognizes its own device by this name, so it must
    /// be the one passed to `EventLoop::open`.
    pub fn with_name(name: &str) -> Result<Self, UInputError> {
        use evdev::uinput::VirtualDeviceBuilder;
        use evdev::AttributeSet;

        let mut keys = AttributeSet::new();
        // All standard keyboard keys (0-255)
        for code in 0..256u16 {
            keys.insert(evdev::Key::new(code));
        }

        let device = VirtualDeviceBuilder::new()
            .map_err(|e: std::io::Error| UInputError::DeviceCreation(e.to_string()))?
            .name(name)
            .with_keys(&keys)
            .map_err(|e: std::io::Error| UInputError::DeviceCreation(e.to_string()))?
            .build()
            .map_err(|e: std::io::Error| UInputError::DeviceCreation(e.to_string()))?;

        log::debug!("Virtual device '{}' created", name);

        Ok(Self {
            device,
            pending: Vec::with_capacity(8),
            pressed_keys: PressedKeyState::new(),
        })
    }

    /// Number of keys the device currently holds down
    pub fn pressed_key_count(&self) -> usize {
        self.pressed_keys.len()
    }

    /// Release every key left pressed, one synced group
    pub fn release_all(&mut self) -> Result<(), UInputError> {
        let held = self.pressed_keys.drain();
        if held.is_empty() {
            return Ok(());
        }
        log::debug!("Releasing {} held key(s) on virtual device", held.len());
        for key in held.into_iter().rev() {
            self.write_key(key, Action::Release)?;
        }
        self.sync()
    }

    /// Release held keys and close the device
    pub fn close(mut self) -> Result<(), UInputError> {
        self.release_all()
    }
}

impl KeyEmitter for VirtualDevice {
    fn write_key(&mut self, key: Key, action: Action) -> Result<(), UInputError> {
        self.pending
            .push(InputEvent::new(EventType::KEY, key.code(), action.to_i32()));
        self.pressed_keys.apply(key, action);
        Ok(())
    }

    fn sync(&mut self) -> Result<(), UInputError> {
        // emit() appends the SYN_REPORT the kernel needs to process the batch
        let result = self
            .device
            .emit(&self.pending)
            .map_err(|e: std::io::Error| UInputError::WriteError(e.to_string()));
        self.pending.clear();
        result
    }
}

impl Drop for VirtualDevice {
    fn drop(&mut self) {
        if let Err(e) = self.release_all() {
            log::warn!("Failed to release held keys on shutdown: {}", e);
        }
    }
}
