// Typeswitch Output Layer
// Synthetic key emission: sink trait, timed emulation, uinput device

mod emitter;
mod emulator;
mod state;

#[cfg(feature = "evdev-backend")]
mod uinput;

pub use emitter::{EmittedOp, KeyEmitter, RecordingEmitter};
pub use emulator::{KeyEmulator, DEFAULT_EMULATION_DELAY};
pub use state::PressedKeyState;

#[cfg(feature = "evdev-backend")]
pub use uinput::VirtualDevice;

/// Name of the virtual device; input devices carrying it are never read.
pub const VIRTUAL_DEVICE_NAME: &str = "Typeswitch (virtual) input emulator";

/// Error types for synthetic output
#[derive(Debug, thiserror::Error)]
pub enum UInputError {
    #[error("Failed to create virtual device: {0}")]
    DeviceCreation(String),

    #[error("Failed to write event: {0}")]
    WriteError(String),
}
