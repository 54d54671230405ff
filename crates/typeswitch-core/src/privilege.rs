// Typeswitch Privilege Check
// Raw input devices and uinput need root

/// Exit status when started without root privileges
pub const EXIT_NOT_PRIVILEGED: i32 = 126;

#[derive(Debug, thiserror::Error)]
pub enum PrivilegeError {
    #[error(
        "typeswitch can only be run by root (effective uid is {0}).\n  Try: sudo typeswitch, or run it from a systemd unit."
    )]
    NotRoot(u32),
}

/// Effective user id of this process
pub fn effective_uid() -> u32 {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() }
}

/// Fail unless running with an effective uid of 0.
///
/// Must be called before any input device is opened.
pub fn ensure_root() -> Result<(), PrivilegeError> {
    check_uid(effective_uid())
}

fn check_uid(uid: u32) -> Result<(), PrivilegeError> {
    if uid == 0 {
        Ok(())
    } else {
        Err(PrivilegeError::NotRoot(uid))
    }
}
