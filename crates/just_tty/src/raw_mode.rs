use log::warn;
use std::{
    io,
    mem::MaybeUninit,
    os::fd::{AsRawFd, BorrowedFd},
};

/// Terminal switched out of canonical mode.
///
/// Settings are captured on [`RawMode::enter`] and put back when the guard is dropped, so
/// every exit path leaves the terminal as it was found. Terminal settings are process wide,
/// nothing else may change them while a guard is alive.
pub struct RawMode<'fd> {
    fd: BorrowedFd<'fd>,
    saved: libc::termios,
}

impl<'fd> RawMode<'fd> {
    /// Disable line buffering and signal generation. `read` returns once `min_bytes` bytes
    /// are available, `0` makes it return immediately.
    pub fn enter(fd: BorrowedFd<'fd>, echo: bool, min_bytes: u8) -> io::Result<Self> {
        let saved = get_attr(fd)?;

        let mut raw = saved;
        raw.c_lflag &= !(libc::ICANON | libc::ISIG);
        if echo {
            raw.c_lflag |= libc::ECHO;
        } else {
            raw.c_lflag &= !libc::ECHO;
        }
        raw.c_cc[libc::VMIN] = min_bytes;
        raw.c_cc[libc::VTIME] = 0;
        set_attr(fd, &raw)?;

        Ok(Self { fd, saved })
    }

    #[inline]
    pub fn fd(&self) -> BorrowedFd<'fd> {
        self.fd
    }
}

impl Drop for RawMode<'_> {
    fn drop(&mut self) {
        if let Err(err) = set_attr(self.fd, &self.saved) {
            warn!("Could not restore terminal settings: {err}");
        }
    }
}

pub(crate) fn get_attr(fd: BorrowedFd<'_>) -> io::Result<libc::termios> {
    let mut attr = MaybeUninit::<libc::termios>::uninit();
    // SAFETY: `tcgetattr` fills the whole struct on success
    if unsafe { libc::tcgetattr(fd.as_raw_fd(), attr.as_mut_ptr()) } != 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: initialized by the successful `tcgetattr` above
    Ok(unsafe { attr.assume_init() })
}

fn set_attr(fd: BorrowedFd<'_>, attr: &libc::termios) -> io::Result<()> {
    // SAFETY: `attr` is a valid termios borrowed for the duration of the call
    if unsafe { libc::tcsetattr(fd.as_raw_fd(), libc::TCSANOW, attr) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
