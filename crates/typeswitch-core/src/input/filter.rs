// Typeswitch Input Layer - Device Filtering

/// Decide whether the event loop should listen on a device.
///
/// 1. With an explicit filter, a device is used when its path or name equals
///    one of the entries, unless it is our own virtual device.
/// 2. Without a filter, every non-virtual device that can emit key events is
///    used, pointing devices included.
pub fn matches_device_filter(
    device_name: &str,
    device_path: &str,
    filter_names: &[String],
    is_key_capable: bool,
    is_virtual: bool,
) -> bool {
    if is_virtual {
        return false;
    }

    if !filter_names.is_empty() {
        return filter_names
            .iter()
            .any(|match_name| device_path == match_name || device_name == match_name);
    }

    is_key_capable
}
