// Typeswitch Event Handling
// Input multiplexing and the main run loop

mod runner;
mod source;

#[cfg(feature = "evdev-backend")]
pub mod r#loop;
#[cfg(feature = "evdev-backend")]
pub mod poll;

pub use runner::{RunError, RunLoop, RunStats};
pub use source::{EventLoopError, EventLoopResult, EventSource, KeyEvents};

#[cfg(feature = "evdev-backend")]
pub use r#loop::{DeviceInfo, EventLoop};
