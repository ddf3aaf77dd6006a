use crate::raw_mode::RawMode;
use log::{debug, trace};
use std::{
    io,
    os::fd::{AsFd, AsRawFd},
    thread,
    time::Duration,
};

/// Sleep between queue probes while waiting with a timeout
pub const POLL_INTERVAL: Duration = Duration::from_millis(1);
const POLL_INTERVAL_MS: i32 = POLL_INTERVAL.as_millis() as i32;

/// Single byte read from the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyCode(u8);

impl KeyCode {
    pub const ESCAPE: Self = Self(0x1b);

    /// Value reported when no key arrived in time
    pub const NONE: i32 = -1;

    #[inline(always)]
    pub const fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    #[inline(always)]
    pub fn inner(self) -> u8 {
        self.0
    }

    /// Integer form used by windowing front-ends, [`KeyCode::NONE`] for no key
    #[inline]
    pub fn raw(key: Option<Self>) -> i32 {
        key.map_or(Self::NONE, |key| i32::from(key.0))
    }
}

impl From<KeyCode> for char {
    #[inline]
    fn from(key: KeyCode) -> Self {
        char::from(key.0)
    }
}

/// Source of key presses
pub trait KeyInput {
    /// Bytes that can be read right now without blocking
    fn pending(&mut self) -> io::Result<usize>;

    /// Read one key. With `wait` the call blocks until a key arrives, otherwise it returns
    /// `None` when nothing is queued.
    fn read_key(&mut self, wait: bool) -> io::Result<Option<KeyCode>>;
}

impl<T> KeyInput for Box<T>
where
    T: KeyInput + ?Sized,
{
    #[inline]
    fn pending(&mut self) -> io::Result<usize> {
        (**self).pending()
    }

    #[inline]
    fn read_key(&mut self, wait: bool) -> io::Result<Option<KeyCode>> {
        (**self).read_key(wait)
    }
}

/// Terminal device, every call enters raw mode for exactly one probe or read
#[derive(Debug)]
pub struct Tty<F> {
    inner: F,
}

impl Tty<io::Stdin> {
    #[inline]
    pub fn stdin() -> Self {
        Self::new(io::stdin())
    }
}

impl<F> Tty<F>
where
    F: AsFd,
{
    #[inline]
    pub fn new(inner: F) -> Self {
        Self { inner }
    }

    #[inline]
    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<F> KeyInput for Tty<F>
where
    F: AsFd,
{
    fn pending(&mut self) -> io::Result<usize> {
        let raw = RawMode::enter(self.inner.as_fd(), false, 1)?;

        let mut count: libc::c_int = 0;
        // SAFETY: FIONREAD stores a single int
        if unsafe { libc::ioctl(raw.fd().as_raw_fd(), libc::FIONREAD, &mut count) } < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(count.max(0) as usize)
    }

    fn read_key(&mut self, wait: bool) -> io::Result<Option<KeyCode>> {
        let raw = RawMode::enter(self.inner.as_fd(), false, u8::from(wait))?;

        let mut byte = 0u8;
        loop {
            // SAFETY: reads at most one byte into `byte`
            let read = unsafe {
                libc::read(
                    raw.fd().as_raw_fd(),
                    (&mut byte as *mut u8).cast::<libc::c_void>(),
                    1,
                )
            };

            match read {
                1 => return Ok(Some(KeyCode(byte))),
                0 => return Ok(None),
                _ => {
                    let err = io::Error::last_os_error();
                    match err.kind() {
                        io::ErrorKind::Interrupted => continue,
                        io::ErrorKind::WouldBlock => return Ok(None),
                        _ => return Err(err),
                    }
                }
            }
        }
    }
}

/// Key queries on top of a [`KeyInput`]. Keys that piled up since the last query are
/// collapsed into the most recent one.
#[derive(Debug)]
pub struct KeyboardPoller<I> {
    input: I,
}

impl<I> KeyboardPoller<I>
where
    I: KeyInput,
{
    #[inline]
    pub fn new(input: I) -> Self {
        Self { input }
    }

    #[inline]
    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    #[inline]
    pub fn into_inner(self) -> I {
        self.input
    }

    /// Latest queued key, never blocks
    pub fn poll_pending_key(&mut self) -> io::Result<Option<KeyCode>> {
        if self.input.pending()? == 0 {
            return Ok(None);
        }
        self.read_latest(false)
    }

    /// Wait for a key. `delay_ms <= 0` waits forever, otherwise gives up after roughly
    /// `delay_ms` milliseconds and returns `None`.
    pub fn wait_key(&mut self, delay_ms: i32) -> io::Result<Option<KeyCode>> {
        if delay_ms <= 0 {
            return self.read_latest(true);
        }

        let mut remaining = delay_ms;
        loop {
            if self.input.pending()? > 0 {
                return self.read_latest(true);
            }
            if remaining <= 0 {
                debug!("No key within {delay_ms} ms");
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL);
            remaining -= POLL_INTERVAL_MS;
        }
    }

    /// Read one key, then drain everything already buffered and keep the last one
    fn read_latest(&mut self, wait: bool) -> io::Result<Option<KeyCode>> {
        let mut latest = self.input.read_key(wait)?;
        trace!("Read key {latest:?}");

        while let Some(key) = self.input.read_key(false)? {
            trace!("Drained key {key:?}");
            latest = Some(key);
        }

        Ok(latest)
    }
}
