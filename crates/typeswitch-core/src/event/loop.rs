// Typeswitch evdev Event Loop
// Multiplexes every physical input device with poll(2)

use evdev::Device;
use std::io::ErrorKind;
use std::os::unix::io::AsRawFd;

use super::poll::{device_status, has_input, DeviceStatus, PollSet};
use super::source::{EventLoopError, EventLoopResult, EventSource};
use crate::input::{
    is_key_capable, is_keyboard, is_virtual_device, matches_device_filter, DeviceCapabilities,
    DeviceId, RawKeyEvent,
};

/// Device information for listing devices
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub index: usize,
    pub name: String,
    pub path: Option<String>,
    /// Looks like a full keyboard (as opposed to a mouse, power button...)
    pub is_keyboard: bool,
    /// Would be listened on without a device filter
    pub listened: bool,
}

struct OpenDevice {
    id: DeviceId,
    name: String,
    device: Device,
}

/// Reads key events from all selected physical devices.
///
/// Devices are only read, never grabbed: the desktop keeps receiving the
/// real input and the virtual device only adds to it.
pub struct EventLoop {
    devices: PollSet<OpenDevice>,
}

impl EventLoop {
    /// Open every device matching the filter, skipping our own virtual device.
    ///
    /// An empty filter selects all key-capable devices.
    pub fn open(filter_names: &[String], virtual_name: &str) -> EventLoopResult<Self> {
        let mut devices = PollSet::new();

        for (path, device) in evdev::enumerate() {
            let name = device.name().unwrap_or("Unknown").to_string();
            let device_path = path.to_str().unwrap_or_default();
            let caps = Self::capabilities(&device);

            if matches_device_filter(
                &name,
                device_path,
                filter_names,
                is_key_capable(&caps),
                is_virtual_device(&name, virtual_name),
            ) {
                let id = DeviceId(devices.len() as u32);
                log::debug!("Listening on {} '{}' ({})", id, name, device_path);
                devices.push(device.as_raw_fd(), OpenDevice { id, name, device });
            }
        }

        if devices.is_empty() {
            return Err(EventLoopError::DeviceNotFound(
                "No matching input devices found".to_string(),
            ));
        }

        Ok(Self { devices })
    }

    /// List every input device that can emit key events.
    ///
    /// This is used by the --list-devices CLI flag.
    pub fn list_devices(virtual_name: &str) -> EventLoopResult<Vec<DeviceInfo>> {
        let mut devices_info = Vec::new();

        for (path, device) in evdev::enumerate() {
            let caps = Self::capabilities(&device);
            if !is_key_capable(&caps) {
                continue;
            }
            let name = device.name().unwrap_or("Unknown").to_string();
            let listened = !is_virtual_device(&name, virtual_name);
            devices_info.push(DeviceInfo {
                index: devices_info.len(),
                name,
                path: path.to_str().map(|s| s.to_string()),
                is_keyboard: is_keyboard(&caps),
                listened,
            });
        }

        if devices_info.is_empty() {
            return Err(EventLoopError::DeviceNotFound(
                "No input devices with keys or buttons found".to_string(),
            ));
        }

        Ok(devices_info)
    }

    fn capabilities(device: &Device) -> DeviceCapabilities {
        let has_ev_key = device.supported_events().contains(evdev::EventType::KEY);
        let supported_keys = device
            .supported_keys()
            .map(|keys| keys.iter().map(|k| k.code()).collect())
            .unwrap_or_default();
        DeviceCapabilities::new(has_ev_key, supported_keys)
    }

    /// Stop listening on a device, e.g. after it was unplugged
    fn drop_device(&mut self, index: usize) {
        let removed = self.devices.remove(index);
        log::warn!(
            "Input device {} '{}' is gone, {} device(s) left",
            removed.id,
            removed.name,
            self.devices.len()
        );
    }

    pub fn device_names(&self) -> Vec<String> {
        self.devices.entries().iter().map(|d| d.name.clone()).collect()
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }
}

impl EventSource for EventLoop {
    /// Wait for input with `poll(2)` and read all ready devices.
    ///
    /// EINTR (a signal arrived) is reported as an empty batch so the caller
    /// can check its stop flag. A device that hangs up is read one last time
    /// before it is dropped.
    fn poll_events(&mut self, timeout_ms: i32) -> EventLoopResult<Vec<RawKeyEvent>> {
        let mut events = Vec::new();

        match self.devices.poll(timeout_ms) {
            Ok(0) => return Ok(events),
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::Interrupted => return Ok(events),
            Err(e) => return Err(EventLoopError::Io(e)),
        }

        let mut lost = Vec::new();
        for (i, revents, open) in self.devices.iter_mut() {
            let mut read_error = None;

            if has_input(revents) {
                match open.device.fetch_events() {
                    Ok(device_events) => {
                        for event in device_events {
                            if let Some(key_event) = RawKeyEvent::from_raw(
                                event.event_type().0,
                                event.code(),
                                event.value(),
                                open.id,
                            ) {
                                log::debug!("Real kb: {}", key_event);
                                events.push(key_event);
                            }
                        }
                    }
                    Err(e) => {
                        log::debug!("Read from '{}' failed: {}", open.name, e);
                        read_error = Some(e.kind());
                    }
                }
            }

            if device_status(revents, read_error) == DeviceStatus::Drop {
                lost.push(i);
            }
        }

        for index in lost.into_iter().rev() {
            self.drop_device(index);
        }

        Ok(events)
    }

    fn is_exhausted(&self) -> bool {
        self.devices.is_empty()
    }
}
