use crate::{window::Window, WindowFlags};
use just_fbdev::{Blit, DeviceInfo, DeviceKind, FramebufferDevice, DEFAULT_DEVICE_PATH};
use just_tty::{KeyCode, KeyInput, KeyboardPoller, Tty};
use log::{debug, error, info, warn};
use std::{
    cell::RefCell,
    env, fmt,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

/// Selects the operating mode: `FB`, `XVFB` or `EMU`
pub const MODE_ENV: &str = "JUSTFB_MODE";

/// Device path override, takes precedence over [`GENERIC_DEVICE_ENV`]
pub const DEVICE_ENV: &str = "JUSTFB_DEVICE";

/// Device path override shared with other framebuffer programs
pub const GENERIC_DEVICE_ENV: &str = "FRAMEBUFFER";

/// Geometry reported when no device is open
pub const EMULATED_WIDTH: u32 = 1024;
pub const EMULATED_HEIGHT: u32 = 768;

static LIVE_BACKENDS: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Linux framebuffer device
    Framebuffer,
    /// Screen of an `Xvfb -fbdir` server, stored as an XWD dump
    Xvfb,
    /// Nothing is drawn, windows accept every call
    #[default]
    Emulated,
}

impl Mode {
    /// Parse a mode name, surrounding whitespace and case are ignored
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("FB") {
            Some(Self::Framebuffer)
        } else if value.eq_ignore_ascii_case("XVFB") {
            Some(Self::Xvfb)
        } else if value.eq_ignore_ascii_case("EMU") {
            Some(Self::Emulated)
        } else {
            None
        }
    }

    /// Mode for a configuration value, anything missing or unknown selects [`Mode::Emulated`]
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(|value| (value, Self::parse(value))) {
            None => Self::Emulated,
            Some((_, Some(mode))) => mode,
            Some((value, None)) => {
                warn!("Unknown mode '{value}', falling back to emulated mode");
                Self::Emulated
            }
        }
    }

    #[inline]
    pub fn device_kind(self) -> Option<DeviceKind> {
        match self {
            Self::Framebuffer => Some(DeviceKind::Framebuffer),
            Self::Xvfb => Some(DeviceKind::Xwd),
            Self::Emulated => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Framebuffer => f.write_str("FB"),
            Self::Xvfb => f.write_str("XVFB"),
            Self::Emulated => f.write_str("EMU"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mode: Mode,
    pub device_path: PathBuf,
}

impl Config {
    #[inline]
    pub fn new<P>(mode: Mode, device_path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            mode,
            device_path: device_path.into(),
        }
    }

    /// Read [`MODE_ENV`], [`DEVICE_ENV`] and [`GENERIC_DEVICE_ENV`]
    pub fn from_env() -> Self {
        let mode = env::var(MODE_ENV).ok();
        let device = env::var(DEVICE_ENV).ok();
        let generic_device = env::var(GENERIC_DEVICE_ENV).ok();

        Self {
            mode: Mode::from_setting(mode.as_deref()),
            device_path: Self::resolve_device_path(device.as_deref(), generic_device.as_deref()),
        }
    }

    /// First non-empty override wins, [`DEFAULT_DEVICE_PATH`] otherwise
    pub fn resolve_device_path(device: Option<&str>, generic_device: Option<&str>) -> PathBuf {
        [device, generic_device]
            .into_iter()
            .flatten()
            .find(|path| !path.is_empty())
            .unwrap_or(DEFAULT_DEVICE_PATH)
            .into()
    }
}

impl Default for Config {
    #[inline]
    fn default() -> Self {
        Self::new(Mode::default(), DEFAULT_DEVICE_PATH)
    }
}

enum Screen {
    Device(FramebufferDevice),
    Emulated,
}

/// Owner of the pixel device and the keyboard. Windows borrow the backend, so they can
/// never outlive it.
pub struct Backend {
    mode: Mode,
    screen: RefCell<Screen>,
    keyboard: RefCell<KeyboardPoller<Box<dyn KeyInput>>>,
}

impl Backend {
    /// Backend configured from the environment, reading keys from standard input
    #[inline]
    pub fn new() -> Self {
        Self::with_config(&Config::from_env())
    }

    #[inline]
    pub fn with_config(config: &Config) -> Self {
        Self::with_input(config, Box::new(Tty::stdin()))
    }

    /// Open the configured device. Any failure is logged and leaves the backend in
    /// [`Mode::Emulated`].
    pub fn with_input(config: &Config, input: Box<dyn KeyInput>) -> Self {
        if LIVE_BACKENDS.fetch_add(1, Ordering::SeqCst) > 0 {
            warn!("Another backend is alive, writes to a shared device are not coordinated");
        }

        let screen = match config.mode.device_kind() {
            None => Screen::Emulated,
            Some(kind) => match FramebufferDevice::open(&config.device_path, kind) {
                Ok(device) => Screen::Device(device),
                Err(err) => {
                    error!(
                        "Could not use '{}' in {} mode, falling back to emulated mode: {err}",
                        config.device_path.display(),
                        config.mode
                    );
                    Screen::Emulated
                }
            },
        };

        let mode = match screen {
            Screen::Device(_) => config.mode,
            Screen::Emulated => Mode::Emulated,
        };

        let backend = Self {
            mode,
            screen: RefCell::new(screen),
            keyboard: RefCell::new(KeyboardPoller::new(input)),
        };
        info!(
            "Backend running in {} mode at {}x{}",
            backend.mode,
            backend.width(),
            backend.height()
        );
        backend
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Geometry of the open device, `None` in emulated mode
    pub fn device_info(&self) -> Option<DeviceInfo> {
        self.with_device(FramebufferDevice::info)
    }

    pub fn device_path(&self) -> Option<PathBuf> {
        self.with_device(|device| device.path().to_path_buf())
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.device_info().map_or(EMULATED_WIDTH, |info| info.width)
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.device_info().map_or(EMULATED_HEIGHT, |info| info.height)
    }

    /// Run `f` on the open device, `None` in emulated mode
    pub fn with_device<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&FramebufferDevice) -> R,
    {
        match &*self.screen.borrow() {
            Screen::Device(device) => Some(f(device)),
            Screen::Emulated => None,
        }
    }

    /// New window covering the whole device
    pub fn create_window(&self, name: impl Into<String>, flags: WindowFlags) -> Window<'_> {
        Window::new(self, name.into(), flags)
    }

    pub fn destroy_all_windows(&self) {
        debug!("Windows are not tracked, nothing to destroy");
    }

    pub(crate) fn write(&self, blit: &Blit, pixels: &[u8], row_stride: usize) -> usize {
        match &mut *self.screen.borrow_mut() {
            Screen::Device(device) => device.write(blit, pixels, row_stride),
            Screen::Emulated => {
                warn!("No device to draw on, ignoring blit {blit:?}");
                0
            }
        }
    }

    pub(crate) fn restore_background(&self, region: &Blit) -> usize {
        match &mut *self.screen.borrow_mut() {
            Screen::Device(device) => device.restore_background(region),
            Screen::Emulated => 0,
        }
    }

    /// Latest key queued on the terminal without waiting
    pub fn poll_pending_key(&self) -> Option<KeyCode> {
        let key = self.keyboard.borrow_mut().poll_pending_key();
        Self::key_or_none(key)
    }

    /// Like [`Backend::poll_pending_key`], [`KeyCode::NONE`] when no key is queued
    #[inline]
    pub fn poll_key(&self) -> i32 {
        KeyCode::raw(self.poll_pending_key())
    }

    /// Wait for a key, forever when `delay_ms <= 0`
    pub fn wait_key(&self, delay_ms: i32) -> Option<KeyCode> {
        let key = self.keyboard.borrow_mut().wait_key(delay_ms);
        Self::key_or_none(key)
    }

    /// Like [`Backend::wait_key`], [`KeyCode::NONE`] on timeout
    #[inline]
    pub fn wait_key_ex(&self, delay_ms: i32) -> i32 {
        KeyCode::raw(self.wait_key(delay_ms))
    }

    fn key_or_none(key: std::io::Result<Option<KeyCode>>) -> Option<KeyCode> {
        key.unwrap_or_else(|err| {
            warn!("Could not read the keyboard: {err}");
            None
        })
    }
}

impl Default for Backend {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("mode", &self.mode)
            .field("device_path", &self.device_path().as_deref().map(Path::display))
            .field("width", &self.width())
            .field("height", &self.height())
            .finish_non_exhaustive()
    }
}

impl Drop for Backend {
    fn drop(&mut self) {
        LIVE_BACKENDS.fetch_sub(1, Ordering::SeqCst);
        if let Screen::Device(device) = self.screen.replace(Screen::Emulated) {
            debug!("Closing '{}'", device.path().display());
            device.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_names() {
        assert_eq!(Mode::parse("FB"), Some(Mode::Framebuffer));
        assert_eq!(Mode::parse(" xvfb\n"), Some(Mode::Xvfb));
        assert_eq!(Mode::parse("Emu"), Some(Mode::Emulated));
        assert_eq!(Mode::parse("fbdev"), None);
        assert_eq!(Mode::parse(""), None);
    }

    #[test]
    fn missing_or_unknown_mode_is_emulated() {
        assert_eq!(Mode::from_setting(None), Mode::Emulated);
        assert_eq!(Mode::from_setting(Some("wayland")), Mode::Emulated);
        assert_eq!(Mode::from_setting(Some("fb")), Mode::Framebuffer);
    }

    #[test]
    fn mode_display_parses_back() {
        for mode in [Mode::Framebuffer, Mode::Xvfb, Mode::Emulated] {
            assert_eq!(Mode::parse(&mode.to_string()), Some(mode));
        }
    }

    #[test]
    fn device_kinds() {
        assert_eq!(Mode::Framebuffer.device_kind(), Some(DeviceKind::Framebuffer));
        assert_eq!(Mode::Xvfb.device_kind(), Some(DeviceKind::Xwd));
        assert_eq!(Mode::Emulated.device_kind(), None);
    }

    #[test]
    fn device_path_precedence() {
        assert_eq!(
            Config::resolve_device_path(Some("/dev/fb1"), Some("/dev/fb2")),
            PathBuf::from("/dev/fb1")
        );
        assert_eq!(
            Config::resolve_device_path(None, Some("/dev/fb2")),
            PathBuf::from("/dev/fb2")
        );
        assert_eq!(
            Config::resolve_device_path(Some(""), Some("/dev/fb2")),
            PathBuf::from("/dev/fb2")
        );
        assert_eq!(
            Config::resolve_device_path(Some(""), None),
            PathBuf::from(DEFAULT_DEVICE_PATH)
        );
    }
}
