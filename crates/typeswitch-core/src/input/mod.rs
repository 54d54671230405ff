// Typeswitch Input Layer
// Raw key events, device detection and filtering

mod device;
mod event;
mod filter;

pub use device::{is_key_capable, is_keyboard, is_virtual_device, DeviceCapabilities};
pub use event::{is_key_event, DeviceId, RawKeyEvent, EV_KEY};
pub use filter::matches_device_filter;
