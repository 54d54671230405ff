// Typeswitch Core Library
// Buffer typed keys, then delete, switch layout and retype them

pub mod action;
pub mod config;
pub mod event;
pub mod input;
pub mod key;
pub mod output;
pub mod privilege;
pub mod state;
pub mod switcher;

pub use action::Action;
pub use config::{Config, ConfigError, LayoutShortcut};
pub use event::{EventLoopError, EventSource, RunError, RunLoop, RunStats};
pub use input::{DeviceId, RawKeyEvent};
pub use key::Key;
pub use output::{KeyEmitter, KeyEmulator, RecordingEmitter, UInputError, VIRTUAL_DEVICE_NAME};
pub use privilege::{ensure_root, PrivilegeError, EXIT_NOT_PRIVILEGED};
pub use state::EventBuffer;
pub use switcher::{ActiveKeySet, KeyClass, Switcher};

#[cfg(feature = "evdev-backend")]
pub use event::EventLoop;
#[cfg(feature = "evdev-backend")]
pub use output::VirtualDevice;
