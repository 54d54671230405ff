// Typeswitch Poll Set
// File descriptors waited on together, kept in step with their owners

use std::io::ErrorKind;
use std::os::unix::io::RawFd;

/// Outcome of one poll round for a single device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    Keep,
    Drop,
}

const POLL_GONE: libc::c_short = libc::POLLERR | libc::POLLHUP | libc::POLLNVAL;

/// Whether the device has queued input, even if it is also hanging up
pub fn has_input(revents: libc::c_short) -> bool {
    revents & libc::POLLIN != 0
}

/// Decide whether a device stays in the wait set.
///
/// `read_error` is the kind of the error returned by the read that
/// followed a `POLLIN`, if any. Interrupted and would-block reads are not
/// failures.
pub fn device_status(revents: libc::c_short, read_error: Option<ErrorKind>) -> DeviceStatus {
    let read_failed = matches!(
        read_error,
        Some(kind) if !matches!(kind, ErrorKind::WouldBlock | ErrorKind::Interrupted)
    );
    if read_failed || revents & POLL_GONE != 0 {
        DeviceStatus::Drop
    } else {
        DeviceStatus::Keep
    }
}

/// Entries and their `pollfd`s, always at matching indices.
pub struct PollSet<T> {
    entries: Vec<T>,
    fds: Vec<libc::pollfd>,
}

impl<T> PollSet<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            fds: Vec::new(),
        }
    }

    pub fn push(&mut self, fd: RawFd, entry: T) {
        self.fds.push(libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        });
        self.entries.push(entry);
    }

    /// Wait up to `timeout_ms` and return the number of ready descriptors
    pub fn poll(&mut self, timeout_ms: i32) -> std::io::Result<usize> {
        // SAFETY: fds is a valid, exclusively borrowed array of pollfd
        let result = unsafe {
            libc::poll(
                self.fds.as_mut_ptr(),
                self.fds.len() as libc::nfds_t,
                timeout_ms,
            )
        };
        if result < 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(result as usize)
    }

    /// Every entry with the `revents` of the last poll
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, libc::c_short, &mut T)> {
        self.fds
            .iter()
            .zip(self.entries.iter_mut())
            .enumerate()
            .map(|(i, (fd, entry))| (i, fd.revents, entry))
    }

    /// Remove an entry together with its descriptor
    pub fn remove(&mut self, index: usize) -> T {
        self.fds.remove(index);
        self.entries.remove(index)
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }

    pub fn fds(&self) -> &[libc::pollfd] {
        &self.fds
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for PollSet<T> {
    fn default() -> Self {
        Self::new()
    }
}
